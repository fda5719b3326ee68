//! Error types for the orders service.

use crate::ports::{AuthError, GatewayError, InventoryError};

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: u32, requested: u32 },

    #[error("{0}")]
    InvalidState(String),

    #[error("Refund amount {requested} exceeds order total {total}")]
    InvalidAmount { requested: i64, total: i64 },

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Entity not found")]
    NotFound,

    /// The record changed since it was read (version mismatch) or a unique
    /// constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: u32, requested: u32 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid amount: refund {requested} exceeds total {total}")]
    InvalidAmount { requested: i64, total: i64 },

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InsufficientStock {
                available,
                requested,
            } => AppError::InsufficientStock {
                available,
                requested,
            },
            DomainError::InvalidState(msg) => AppError::InvalidState(msg),
            DomainError::InvalidAmount { requested, total } => {
                AppError::InvalidAmount { requested, total }
            }
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::ValidationError(msg) => AppError::BadRequest(msg),
            e @ DomainError::NegativeAmount => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::Conflict(e),
        }
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::NotFound(id) => AppError::NotFound(format!("Product {}", id)),
            InventoryError::Unavailable(msg) => {
                AppError::Unavailable(format!("Inventory service: {}", msg))
            }
            InventoryError::Conflict(msg) => {
                AppError::Conflict(format!("Inventory update rejected: {}", msg))
            }
            InventoryError::InvalidResponse(msg) => {
                AppError::Unavailable(format!("Inventory service: {}", msg))
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unavailable(msg) => AppError::Unavailable(format!("User service: {}", msg)),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::PaymentFailed(err.to_string())
    }
}
