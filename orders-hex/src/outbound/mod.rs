//! Outbound adapters
//!
//! Implementations of the collaborator ports: the inventory and user
//! services over HTTP, and the payment gateway.

mod gateway;
mod inventory;
mod users;

pub use gateway::SimulatedGateway;
pub use inventory::HttpInventoryClient;
pub use users::HttpAuthenticator;
