//! Test doubles shared by the HTTP integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
};
use http_body_util::BodyExt;

use orders_hex::{OrderService, inbound::HttpServer};
use orders_repo::MemoryRepo;
use orders_types::{
    AuthError, AuthenticatedUser, Authenticator, FeeRate, InventoryClient, InventoryError, Money,
    ProductId, ProductSnapshot, UserId,
};

/// Inventory holding products in memory.
#[derive(Clone, Default)]
pub struct StubInventory {
    products: Arc<Mutex<HashMap<ProductId, ProductSnapshot>>>,
}

impl StubInventory {
    pub fn with_product(id: &str, price: i64, quantity: u32) -> Self {
        let inventory = Self::default();
        inventory.products.lock().unwrap().insert(
            ProductId::new(id),
            ProductSnapshot {
                price: Money::new(price).unwrap(),
                quantity,
            },
        );
        inventory
    }

    pub fn quantity(&self, id: &str) -> u32 {
        self.products.lock().unwrap()[&ProductId::new(id)].quantity
    }
}

#[async_trait]
impl InventoryClient for StubInventory {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<ProductSnapshot, InventoryError> {
        self.products
            .lock()
            .unwrap()
            .get(product_id)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(product_id.clone()))
    }

    async fn adjust_quantity(
        &self,
        product_id: &ProductId,
        new_quantity: u32,
    ) -> Result<(), InventoryError> {
        let mut products = self.products.lock().unwrap();
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| InventoryError::NotFound(product_id.clone()))?;
        product.quantity = new_quantity;
        Ok(())
    }
}

/// Accepts `user-<id>`, `admin` and `unverified` tokens.
pub struct StubAuthenticator;

#[async_trait]
impl Authenticator for StubAuthenticator {
    async fn verify(&self, token: &str) -> Result<Option<AuthenticatedUser>, AuthError> {
        let user = match token {
            "admin" => Some(AuthenticatedUser {
                id: UserId::new(99),
                is_verified: true,
                is_admin: true,
            }),
            "unverified" => Some(AuthenticatedUser {
                id: UserId::new(50),
                is_verified: false,
                is_admin: false,
            }),
            other => other
                .strip_prefix("user-")
                .and_then(|id| id.parse().ok())
                .map(|id| AuthenticatedUser {
                    id: UserId::new(id),
                    is_verified: true,
                    is_admin: false,
                }),
        };
        Ok(user)
    }
}

pub fn test_server(
    inventory: StubInventory,
    requests_per_minute: u32,
) -> HttpServer<MemoryRepo, StubInventory> {
    let service = OrderService::new(MemoryRepo::new(), inventory, FeeRate::default());
    HttpServer::with_rate_limit(service, Arc::new(StubAuthenticator), requests_per_minute)
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
