//! Order domain model and lifecycle state machine.
//!
//! ```text
//! pending ──► paid ──► refunded
//!    │
//!    └──────► cancelled
//! ```
//!
//! `payment_status` tracks the payment attempt independently of the
//! commercial `status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{OrderId, PaymentMethodId, ProductId, UserId};
use super::money::{FeeRate, Money};
use crate::error::DomainError;

/// Age after which a `processing` payment claim is treated as abandoned and
/// may be claimed again.
pub const PAYMENT_CLAIM_TIMEOUT_SECS: i64 = 300;

/// Commercial status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Returns true if no guarded transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }
}

impl AsRef<str> for OrderStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            other => Err(DomainError::ValidationError(format!(
                "Unknown order status: {}",
                other
            ))),
        }
    }
}

/// Status of the payment attempt for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AsRef<str> for PaymentStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::ValidationError(format!(
                "Unknown payment status: {}",
                other
            ))),
        }
    }
}

/// A timestamped audit entry on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderNote {
    pub recorded_at: DateTime<Utc>,
    pub message: String,
}

impl OrderNote {
    fn now(message: impl Into<String>) -> Self {
        Self {
            recorded_at: Utc::now(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OrderNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.recorded_at.to_rfc3339(), self.message)
    }
}

/// Price breakdown captured when an order is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub unit_price: Money,
    pub fee: Money,
    pub total: Money,
}

impl Pricing {
    /// `fee = unit_price * quantity * rate`, `total = unit_price * quantity + fee`.
    pub fn compute(unit_price: Money, quantity: u32, rate: FeeRate) -> Result<Self, DomainError> {
        let subtotal = unit_price.checked_mul(quantity)?;
        let fee = rate.fee_on(subtotal)?;
        let total = subtotal.checked_add(fee)?;
        Ok(Self {
            unit_price,
            fee,
            total,
        })
    }
}

/// A customer order for a single inventory product.
///
/// Fields are private so that the pricing invariants and the append-only
/// notes ledger can only change through the lifecycle methods below.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    product_id: ProductId,
    user_id: UserId,
    quantity: u32,
    unit_price: Money,
    fee: Money,
    total: Money,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_method_id: Option<PaymentMethodId>,
    payment_error: Option<String>,
    refund_amount: Option<Money>,
    notes: Vec<OrderNote>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Places a new pending order with the price snapshot taken from inventory.
    pub fn place(
        product_id: ProductId,
        user_id: UserId,
        quantity: u32,
        unit_price: Money,
        fee_rate: FeeRate,
        payment_method_id: Option<PaymentMethodId>,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::ValidationError(
                "Quantity must be greater than zero".into(),
            ));
        }
        if product_id.as_str().trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Product ID cannot be empty".into(),
            ));
        }

        let pricing = Pricing::compute(unit_price, quantity, fee_rate)?;
        let now = Utc::now();

        Ok(Self {
            id: OrderId::new(),
            product_id,
            user_id,
            quantity,
            unit_price: pricing.unit_price,
            fee: pricing.fee,
            total: pricing.total,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method_id,
            payment_error: None,
            refund_amount: None,
            notes: vec![OrderNote {
                recorded_at: now,
                message: "Order created".into(),
            }],
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs an order from stored fields.
    ///
    /// Rejects records whose total does not match their price breakdown or
    /// whose refund exceeds the total.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: OrderId,
        product_id: ProductId,
        user_id: UserId,
        quantity: u32,
        unit_price: Money,
        fee: Money,
        total: Money,
        status: OrderStatus,
        payment_status: PaymentStatus,
        payment_method_id: Option<PaymentMethodId>,
        payment_error: Option<String>,
        refund_amount: Option<Money>,
        notes: Vec<OrderNote>,
        version: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let expected = unit_price.checked_mul(quantity)?.checked_add(fee)?;
        if expected != total {
            return Err(DomainError::ValidationError(format!(
                "Order {} total {} does not match price breakdown {}",
                id, total, expected
            )));
        }
        if refund_amount.is_some_and(|refund| refund > total) {
            return Err(DomainError::ValidationError(format!(
                "Order {} refund exceeds total",
                id
            )));
        }

        Ok(Self {
            id,
            product_id,
            user_id,
            quantity,
            unit_price,
            fee,
            total,
            status,
            payment_status,
            payment_method_id,
            payment_error,
            refund_amount,
            notes,
            version,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn fee(&self) -> Money {
        self.fee
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn payment_method_id(&self) -> Option<PaymentMethodId> {
        self.payment_method_id
    }

    pub fn payment_error(&self) -> Option<&str> {
        self.payment_error.as_deref()
    }

    pub fn refund_amount(&self) -> Option<Money> {
        self.refund_amount
    }

    /// Audit notes in the order they were appended.
    pub fn notes(&self) -> &[OrderNote] {
        &self.notes
    }

    /// Optimistic-concurrency version, incremented by the store on every update.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Returns a copy carrying the next version, as stored after an update.
    pub fn with_next_version(mut self) -> Self {
        self.version += 1;
        self
    }

    fn add_note(&mut self, message: impl Into<String>) {
        let note = OrderNote::now(message);
        self.updated_at = note.recorded_at;
        self.notes.push(note);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Lifecycle transitions
    // ─────────────────────────────────────────────────────────────────────────────

    /// Claims the order for a payment attempt.
    ///
    /// No note is written here; the outcome of the attempt records the single
    /// note for the payment call.
    pub fn begin_payment(&mut self) -> Result<(), DomainError> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::InvalidState(format!(
                "Order must be pending to process payment (status: {})",
                self.status
            )));
        }
        match self.payment_status {
            PaymentStatus::Processing if !self.claim_expired() => Err(DomainError::InvalidState(
                "Payment is already being processed".into(),
            )),
            PaymentStatus::Completed => Err(DomainError::InvalidState(
                "Payment has already been completed".into(),
            )),
            PaymentStatus::Pending | PaymentStatus::Failed | PaymentStatus::Processing => {
                self.payment_status = PaymentStatus::Processing;
                self.payment_error = None;
                self.updated_at = Utc::now();
                Ok(())
            }
        }
    }

    fn claim_expired(&self) -> bool {
        Utc::now() - self.updated_at > chrono::Duration::seconds(PAYMENT_CLAIM_TIMEOUT_SECS)
    }

    /// Records a successful payment: the order becomes paid.
    ///
    /// Fails if the order left `pending` while the charge was in flight.
    pub fn complete_payment(&mut self) -> Result<(), DomainError> {
        self.ensure_processing()?;
        if self.status != OrderStatus::Pending {
            return Err(DomainError::InvalidState(format!(
                "Order is {} and can no longer be paid",
                self.status
            )));
        }
        self.payment_status = PaymentStatus::Completed;
        self.status = OrderStatus::Paid;
        self.add_note("Payment completed successfully");
        Ok(())
    }

    /// Records a failed payment attempt; the order stays pending.
    pub fn fail_payment(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_processing()?;
        let reason = reason.into();
        self.payment_status = PaymentStatus::Failed;
        self.add_note(format!("Payment failed: {}", reason));
        self.payment_error = Some(reason);
        Ok(())
    }

    fn ensure_processing(&self) -> Result<(), DomainError> {
        if self.payment_status != PaymentStatus::Processing {
            return Err(DomainError::InvalidState(format!(
                "No payment in progress (payment status: {})",
                self.payment_status
            )));
        }
        Ok(())
    }

    /// Refunds a paid order. `amount` defaults to the full total.
    pub fn refund(&mut self, amount: Option<Money>, reason: &str) -> Result<Money, DomainError> {
        if self.status != OrderStatus::Paid {
            return Err(DomainError::InvalidState(
                "Order must be paid to process refund".into(),
            ));
        }

        let amount = amount.unwrap_or(self.total);
        if amount.is_zero() {
            return Err(DomainError::ValidationError(
                "Refund amount must be greater than zero".into(),
            ));
        }
        if amount > self.total {
            return Err(DomainError::InvalidAmount {
                requested: amount.amount(),
                total: self.total.amount(),
            });
        }

        self.refund_amount = Some(amount);
        self.status = OrderStatus::Refunded;
        self.add_note(format!("Refund processed: {}. Reason: {}", amount, reason));
        Ok(amount)
    }

    /// Administrative override: sets the status without checking that the
    /// transition is legal.
    pub fn force_status(&mut self, status: OrderStatus, note: Option<String>) {
        let previous = self.status;
        self.status = status;
        let note = note
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Status changed from {} to {}", previous, status));
        self.add_note(note);
    }
}
