//! # Orders Hex
//!
//! Application service layer and the adapters around it.
//!
//! ## Architecture
//!
//! - `service/` - Application service (orchestrates domain operations)
//! - `inbound/` - HTTP adapter (Axum server)
//! - `outbound/` - Clients for the inventory and user services, payment gateway
//!
//! The service is generic over `R: OrderRepository + PaymentMethodRepository`
//! and `I: InventoryClient`, allowing different implementations to be injected.

pub mod inbound;
pub mod openapi;
pub mod outbound;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use service::OrderService;
