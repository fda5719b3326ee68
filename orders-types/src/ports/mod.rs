//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod auth;
mod gateway;
mod inventory;
mod repository;

pub use auth::{AuthError, Authenticator};
pub use gateway::{GatewayError, PaymentGateway};
pub use inventory::{InventoryClient, InventoryError, ProductSnapshot};
pub use repository::{OrderRepository, OrderStore, PaymentMethodRepository};
