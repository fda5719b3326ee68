//! Repository port traits.
//!
//! These are the storage ports in our hexagonal architecture.
//! Adapters (Memory, SQLite, Postgres) implement both traits.

use crate::domain::{Order, OrderId, PaymentMethod, PaymentMethodId, UserId};
use crate::error::RepoError;

/// Storage port for orders.
///
/// `update_order` MUST be a compare-and-swap on the order version so that
/// concurrent updates to the same order cannot be lost.
#[async_trait::async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Persists a newly placed order.
    async fn insert_order(&self, order: &Order) -> Result<(), RepoError>;

    /// Gets an order by ID.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError>;

    /// Lists a user's orders, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepoError>;

    /// Stores `order` if the stored version still equals `order.version()`.
    ///
    /// Returns the stored order (with the incremented version), `NotFound` if
    /// the order does not exist, or `Conflict` if the version moved on.
    async fn update_order(&self, order: &Order) -> Result<Order, RepoError>;
}

/// Storage port for payment methods.
#[async_trait::async_trait]
pub trait PaymentMethodRepository: Send + Sync + 'static {
    /// Persists a new payment method.
    async fn insert_payment_method(&self, method: &PaymentMethod) -> Result<(), RepoError>;

    /// Gets a payment method by ID, active or not.
    async fn get_payment_method(
        &self,
        id: PaymentMethodId,
    ) -> Result<Option<PaymentMethod>, RepoError>;

    /// Lists every payment method of a user, including inactive ones, oldest first.
    async fn list_payment_methods_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PaymentMethod>, RepoError>;

    /// Overwrites a stored payment method.
    async fn update_payment_method(&self, method: &PaymentMethod) -> Result<(), RepoError>;

    /// Stamps `last_used_at` without touching any other field.
    async fn mark_payment_method_used(&self, id: PaymentMethodId) -> Result<(), RepoError>;
}

/// Both storage ports, as required by the order service.
pub trait OrderStore: OrderRepository + PaymentMethodRepository {}

impl<T: OrderRepository + PaymentMethodRepository> OrderStore for T {}
