//! Inventory service port.
//!
//! The inventory service owns products and their stock levels. The orders
//! service only reads a product's current price/quantity and writes back a new
//! quantity when it reserves stock.

use crate::domain::{Money, ProductId};

/// Error type for inventory operations.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Update rejected: {0}")]
    Conflict(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Current price and stock of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub price: Money,
    pub quantity: u32,
}

/// Port trait for the inventory collaborator.
#[async_trait::async_trait]
pub trait InventoryClient: Send + Sync + 'static {
    /// Reads the current price and available quantity of a product.
    async fn fetch_product(&self, product_id: &ProductId) -> Result<ProductSnapshot, InventoryError>;

    /// Sets the available quantity of a product.
    async fn adjust_quantity(
        &self,
        product_id: &ProductId,
        new_quantity: u32,
    ) -> Result<(), InventoryError>;
}
