//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Order, OrderId, OrderNote, OrderStatus, PaymentDetails, PaymentMethod, PaymentMethodId,
    PaymentStatus, ProductId, UserId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Order DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to place a new order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Inventory product to order
    #[schema(value_type = String, example = "01HV7Q3XK2")]
    pub product_id: ProductId,
    /// Number of units, must be positive
    #[schema(example = 2)]
    pub quantity: u32,
    /// Stored payment method to charge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub payment_method_id: Option<PaymentMethodId>,
}

/// Administrative status override.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    /// Note recorded on the order; a default note is written when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Request to refund a paid order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefundRequest {
    /// Amount to refund in minor units, defaults to the full order total
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 2100)]
    pub amount: Option<i64>,
    /// Reason recorded in the order notes
    #[schema(example = "changed mind")]
    pub reason: String,
}

/// Full representation of an order.
///
/// Monetary fields are in minor units (cents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    #[schema(value_type = String)]
    pub id: OrderId,
    #[schema(value_type = String)]
    pub product_id: ProductId,
    #[schema(value_type = i64)]
    pub user_id: UserId,
    pub quantity: u32,
    #[schema(example = 1000)]
    pub unit_price: i64,
    #[schema(example = 100)]
    pub fee: i64,
    #[schema(example = 2100)]
    pub total: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[schema(value_type = Option<String>)]
    pub payment_method_id: Option<PaymentMethodId>,
    pub payment_error: Option<String>,
    pub refund_amount: Option<i64>,
    /// Audit trail in append order
    pub notes: Vec<OrderNote>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            product_id: order.product_id().clone(),
            user_id: order.user_id(),
            quantity: order.quantity(),
            unit_price: order.unit_price().amount(),
            fee: order.fee().amount(),
            total: order.total().amount(),
            status: order.status(),
            payment_status: order.payment_status(),
            payment_method_id: order.payment_method_id(),
            payment_error: order.payment_error().map(String::from),
            refund_amount: order.refund_amount().map(|m| m.amount()),
            notes: order.notes().to_vec(),
            version: order.version(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self::from(&order)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment Method DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to store a new payment method.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePaymentMethodRequest {
    /// Kind of instrument, e.g. "card" or "paypal"
    #[serde(rename = "type")]
    #[schema(example = "card")]
    pub method_type: String,
    /// Instrument data, kept opaque
    #[serde(default)]
    #[schema(value_type = Object)]
    pub details: PaymentDetails,
    /// Make this the user's default method
    #[serde(default)]
    pub is_default: bool,
}

/// A stored payment method, as shown to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethodView {
    #[schema(value_type = String)]
    pub id: PaymentMethodId,
    #[schema(value_type = i64)]
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub method_type: String,
    #[schema(value_type = Object)]
    pub details: PaymentDetails,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<PaymentMethod> for PaymentMethodView {
    fn from(method: PaymentMethod) -> Self {
        Self {
            id: method.id,
            user_id: method.user_id,
            method_type: method.method_type,
            details: method.details,
            is_default: method.is_default,
            is_active: method.is_active,
            created_at: method.created_at,
            updated_at: method.updated_at,
            last_used_at: method.last_used_at,
        }
    }
}

/// Confirmation returned after a payment method is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Payment method deleted successfully")]
    pub message: String,
}
