//! Stored payment instruments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{PaymentMethodId, UserId};
use crate::error::DomainError;

/// Opaque instrument data (card token, PayPal account, ...).
pub type PaymentDetails = serde_json::Map<String, serde_json::Value>;

/// A payment instrument owned by a single user.
///
/// Never physically removed: deleting marks it inactive so historical orders
/// keep a resolvable reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub user_id: UserId,
    /// Free-form tag, e.g. "card" or "paypal"
    pub method_type: String,
    pub details: PaymentDetails,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl PaymentMethod {
    /// Creates a new active payment method.
    ///
    /// # Validation
    /// - Type cannot be empty
    pub fn new(
        user_id: UserId,
        method_type: String,
        details: PaymentDetails,
        is_default: bool,
    ) -> Result<Self, DomainError> {
        let method_type = method_type.trim().to_string();
        if method_type.is_empty() {
            return Err(DomainError::ValidationError(
                "Payment method type cannot be empty".into(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: PaymentMethodId::new(),
            user_id,
            method_type,
            details,
            is_default,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_used_at: None,
        })
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Fails with `Forbidden` unless `user_id` owns this method.
    pub fn ensure_owner(&self, user_id: UserId) -> Result<(), DomainError> {
        if !self.is_owned_by(user_id) {
            return Err(DomainError::Forbidden(
                "Not authorized to use this payment method".into(),
            ));
        }
        Ok(())
    }

    /// Soft-deletes the method on behalf of `requesting_user`.
    pub fn deactivate(&mut self, requesting_user: UserId) -> Result<(), DomainError> {
        if !self.is_owned_by(requesting_user) {
            return Err(DomainError::Forbidden(
                "Not authorized to delete this payment method".into(),
            ));
        }
        self.is_active = false;
        self.is_default = false;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn clear_default(&mut self) {
        self.is_default = false;
        self.updated_at = Utc::now();
    }

    pub fn mark_used(&mut self) {
        let now = Utc::now();
        self.last_used_at = Some(now);
        self.updated_at = now;
    }
}
