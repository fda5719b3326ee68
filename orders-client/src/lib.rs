//! # Orders Client SDK
//!
//! A typed Rust client for the Orders API. Every call except `health` needs
//! a bearer token issued by the user service.

use orders_types::{
    CreateOrderRequest, CreatePaymentMethodRequest, MessageResponse, OrderId, OrderStatus,
    OrderView, PaymentDetails, PaymentMethodId, PaymentMethodView, ProductId, RefundRequest,
    UpdateOrderStatusRequest,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status returned by the API, if the request reached it.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Orders API client.
pub struct OrdersClient {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl OrdersClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http: Client::new(),
        }
    }

    /// Sets the bearer token sent with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Places an order.
    pub async fn create_order(
        &self,
        product_id: &str,
        quantity: u32,
        payment_method_id: Option<PaymentMethodId>,
    ) -> Result<OrderView, ClientError> {
        let req = CreateOrderRequest {
            product_id: ProductId::new(product_id),
            quantity,
            payment_method_id,
        };
        self.post("/orders", &req).await
    }

    /// Lists the caller's orders, newest first.
    pub async fn list_orders(&self) -> Result<Vec<OrderView>, ClientError> {
        self.get("/orders").await
    }

    pub async fn get_order(&self, id: OrderId) -> Result<OrderView, ClientError> {
        self.get(&format!("/orders/{}", id)).await
    }

    /// Charges the order's payment method.
    pub async fn process_payment(&self, id: OrderId) -> Result<OrderView, ClientError> {
        self.post(
            &format!("/orders/{}/process-payment", id),
            &serde_json::json!({}),
        )
        .await
    }

    /// Refunds a paid order. `amount` defaults to the order total.
    pub async fn refund_order(
        &self,
        id: OrderId,
        amount: Option<i64>,
        reason: &str,
    ) -> Result<OrderView, ClientError> {
        let req = RefundRequest {
            amount,
            reason: reason.to_string(),
        };
        self.post(&format!("/orders/{}/refund", id), &req).await
    }

    /// Overrides an order's status (admin only).
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        note: Option<String>,
    ) -> Result<OrderView, ClientError> {
        let req = UpdateOrderStatusRequest { status, note };
        let builder = self
            .http
            .patch(format!("{}/orders/{}/status", self.base_url, id))
            .json(&req);
        self.send(builder).await
    }

    /// Stores a payment method for the caller.
    pub async fn create_payment_method(
        &self,
        method_type: &str,
        details: PaymentDetails,
        is_default: bool,
    ) -> Result<PaymentMethodView, ClientError> {
        let req = CreatePaymentMethodRequest {
            method_type: method_type.to_string(),
            details,
            is_default,
        };
        self.post("/payment-methods", &req).await
    }

    /// Lists the caller's active payment methods.
    pub async fn list_payment_methods(&self) -> Result<Vec<PaymentMethodView>, ClientError> {
        self.get("/payment-methods").await
    }

    pub async fn delete_payment_method(
        &self,
        id: PaymentMethodId,
    ) -> Result<MessageResponse, ClientError> {
        let builder = self
            .http
            .delete(format!("{}/payment-methods/{}", self.base_url, id));
        self.send(builder).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let builder = self.http.get(format!("{}{}", self.base_url, path));
        self.send(builder).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let builder = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body);
        self.send(builder).await
    }

    async fn send<T: DeserializeOwned>(&self, mut builder: RequestBuilder) -> Result<T, ClientError> {
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let resp = builder.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
