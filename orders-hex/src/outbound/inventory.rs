//! HTTP adapter for the inventory service.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use orders_types::{InventoryClient, InventoryError, Money, ProductId, ProductSnapshot};

/// Product fields the orders service reads from the inventory service.
#[derive(Debug, Deserialize)]
struct ProductPayload {
    price: f64,
    quantity: i64,
}

/// Inventory client talking to `GET /products/{id}` and
/// `PATCH /products/{id}/quantity`.
///
/// Every request is bounded by the configured timeout; an expired request is
/// reported as `Unavailable`.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    base_url: Url,
    http: Client,
}

impl HttpInventoryClient {
    /// Creates a client for the inventory service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Inventory service URL cannot carry a path: {}", base_url);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, http })
    }

    /// Builds `{base}/products/{id}[/{tail}]` with the id as one encoded path
    /// segment.
    fn product_url(&self, product_id: &ProductId, tail: &[&str]) -> Result<Url, InventoryError> {
        let id = product_id.as_str();
        // dot segments are dropped by the URL parser and would address another resource
        if id.is_empty() || id == "." || id == ".." {
            return Err(InventoryError::NotFound(product_id.clone()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| InventoryError::Unavailable("invalid inventory base URL".into()))?
            .pop_if_empty()
            .push("products")
            .push(id)
            .extend(tail);
        Ok(url)
    }
}

fn transport_error(err: reqwest::Error) -> InventoryError {
    if err.is_timeout() {
        InventoryError::Unavailable("request timed out".into())
    } else {
        InventoryError::Unavailable(err.to_string())
    }
}

#[async_trait::async_trait]
impl InventoryClient for HttpInventoryClient {
    #[tracing::instrument(skip_all, fields(product_id = %product_id))]
    async fn fetch_product(&self, product_id: &ProductId) -> Result<ProductSnapshot, InventoryError> {
        let resp = self
            .http
            .get(self.product_url(product_id, &[])?)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(InventoryError::NotFound(product_id.clone()));
        }
        if !status.is_success() {
            return Err(InventoryError::Unavailable(format!("HTTP {}", status)));
        }

        let payload: ProductPayload = resp
            .json()
            .await
            .map_err(|e| InventoryError::InvalidResponse(e.to_string()))?;

        let price = Money::from_major_decimal(payload.price)
            .map_err(|e| InventoryError::InvalidResponse(e.to_string()))?;
        // a negative stock level means nothing can be reserved
        let quantity = u32::try_from(payload.quantity.max(0))
            .map_err(|_| InventoryError::InvalidResponse("quantity out of range".into()))?;

        Ok(ProductSnapshot { price, quantity })
    }

    #[tracing::instrument(skip_all, fields(product_id = %product_id, new_quantity))]
    async fn adjust_quantity(
        &self,
        product_id: &ProductId,
        new_quantity: u32,
    ) -> Result<(), InventoryError> {
        let resp = self
            .http
            .patch(self.product_url(product_id, &["quantity"])?)
            .json(&serde_json::json!({ "quantity": new_quantity }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND {
            return Err(InventoryError::NotFound(product_id.clone()));
        }
        if status.is_server_error() {
            return Err(InventoryError::Unavailable(format!("HTTP {}", status)));
        }
        let body = resp.text().await.unwrap_or_default();
        Err(InventoryError::Conflict(format!("HTTP {} {}", status, body)))
    }
}
