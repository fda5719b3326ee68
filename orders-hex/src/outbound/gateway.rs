//! Payment gateway stand-in.

use orders_types::{GatewayError, Order, PaymentGateway, PaymentMethod};

/// Gateway that approves every charge. There is no real settlement behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedGateway;

#[async_trait::async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, order: &Order, method: Option<&PaymentMethod>) -> Result<(), GatewayError> {
        tracing::debug!(
            order_id = %order.id(),
            total = %order.total(),
            method_type = method.map(|m| m.method_type.as_str()).unwrap_or("none"),
            "Simulated charge approved"
        );
        Ok(())
    }
}
