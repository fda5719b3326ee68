//! Database row types shared by the SQLite and PostgreSQL adapters.
//!
//! Both schemas store identifiers as text and notes/details as JSON, so a
//! single row struct per table decodes from either backend.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;

use orders_types::{
    Money, Order, OrderId, OrderNote, PaymentDetails, PaymentMethod, PaymentMethodId, ProductId,
    RepoError, UserId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Order row from database.
#[derive(Debug, FromRow)]
pub struct DbOrder {
    pub id: String,
    pub product_id: String,
    pub user_id: i64,
    pub quantity: i64,
    pub unit_price: i64,
    pub fee: i64,
    pub total: i64,
    pub status: String,
    pub payment_status: String,
    pub payment_method_id: Option<String>,
    pub payment_error: Option<String>,
    pub refund_amount: Option<i64>,
    pub notes: Json<Vec<OrderNote>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment method row from database.
#[derive(Debug, FromRow)]
pub struct DbPaymentMethod {
    pub id: String,
    pub user_id: i64,
    pub method_type: String,
    pub details: Json<PaymentDetails>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

pub const ORDER_COLUMNS: &str = "id, product_id, user_id, quantity, unit_price, fee, total, \
     status, payment_status, payment_method_id, payment_error, refund_amount, notes, version, \
     created_at, updated_at";

pub const PAYMENT_METHOD_COLUMNS: &str =
    "id, user_id, method_type, details, is_default, is_active, created_at, updated_at, last_used_at";

// ─────────────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────────────

fn parse_uuid(value: &str) -> Result<uuid::Uuid, RepoError> {
    uuid::Uuid::parse_str(value).map_err(|e| RepoError::Database(e.to_string()))
}

fn to_u32(value: i64, column: &str) -> Result<u32, RepoError> {
    u32::try_from(value)
        .map_err(|_| RepoError::Database(format!("{} out of range: {}", column, value)))
}

impl DbOrder {
    pub fn from_domain(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            product_id: order.product_id().to_string(),
            user_id: order.user_id().value(),
            quantity: i64::from(order.quantity()),
            unit_price: order.unit_price().amount(),
            fee: order.fee().amount(),
            total: order.total().amount(),
            status: order.status().to_string(),
            payment_status: order.payment_status().to_string(),
            payment_method_id: order.payment_method_id().map(|id| id.to_string()),
            payment_error: order.payment_error().map(String::from),
            refund_amount: order.refund_amount().map(|m| m.amount()),
            notes: Json(order.notes().to_vec()),
            // versions stay far below i64::MAX
            version: order.version() as i64,
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }

    pub fn into_domain(self) -> Result<Order, RepoError> {
        let payment_method_id = self
            .payment_method_id
            .as_deref()
            .map(parse_uuid)
            .transpose()?
            .map(PaymentMethodId::from_uuid);
        let refund_amount = self.refund_amount.map(Money::new).transpose()?;
        let version = u64::try_from(self.version)
            .map_err(|_| RepoError::Database(format!("negative version: {}", self.version)))?;

        let order = Order::from_parts(
            OrderId::from_uuid(parse_uuid(&self.id)?),
            ProductId::new(self.product_id),
            UserId::new(self.user_id),
            to_u32(self.quantity, "quantity")?,
            Money::new(self.unit_price)?,
            Money::new(self.fee)?,
            Money::new(self.total)?,
            self.status.parse()?,
            self.payment_status.parse()?,
            payment_method_id,
            self.payment_error,
            refund_amount,
            self.notes.0,
            version,
            self.created_at,
            self.updated_at,
        )?;
        Ok(order)
    }
}

impl DbPaymentMethod {
    pub fn from_domain(method: &PaymentMethod) -> Self {
        Self {
            id: method.id.to_string(),
            user_id: method.user_id.value(),
            method_type: method.method_type.clone(),
            details: Json(method.details.clone()),
            is_default: method.is_default,
            is_active: method.is_active,
            created_at: method.created_at,
            updated_at: method.updated_at,
            last_used_at: method.last_used_at,
        }
    }

    pub fn into_domain(self) -> Result<PaymentMethod, RepoError> {
        Ok(PaymentMethod {
            id: PaymentMethodId::from_uuid(parse_uuid(&self.id)?),
            user_id: UserId::new(self.user_id),
            method_type: self.method_type,
            details: self.details.0,
            is_default: self.is_default,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_used_at: self.last_used_at,
        })
    }
}

/// Maps a sqlx error, reporting unique-key violations as `Conflict`.
pub fn db_error(err: sqlx::Error) -> RepoError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            return RepoError::Conflict(db.message().to_string());
        }
    }
    RepoError::Database(err.to_string())
}
