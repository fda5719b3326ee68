//! Payment gateway port.

use crate::domain::{Order, PaymentMethod};

/// Error type for payment attempts.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

/// Port trait for charging an order.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Charges the order total, using the stored method when the order has one.
    async fn charge(&self, order: &Order, method: Option<&PaymentMethod>) -> Result<(), GatewayError>;
}
