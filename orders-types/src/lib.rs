//! # Orders Types
//!
//! Domain types and port traits for the orders service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, Order, PaymentMethod)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    AuthenticatedUser, FeeRate, Money, Order, OrderId, OrderNote, OrderStatus, PaymentDetails,
    PaymentMethod, PaymentMethodId, PaymentStatus, Pricing, ProductId, UserId,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use ports::{
    AuthError, Authenticator, GatewayError, InventoryClient, InventoryError, OrderRepository,
    OrderStore, PaymentGateway, PaymentMethodRepository, ProductSnapshot,
};
