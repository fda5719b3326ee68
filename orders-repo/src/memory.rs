//! In-memory repository adapter backed by `DashMap`.
//!
//! Used for local development (`DATABASE_URL=memory://`) and tests. Each order
//! update holds the shard lock of its entry while comparing versions, so
//! updates to different orders never block each other.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use orders_types::{
    Order, OrderId, OrderRepository, PaymentMethod, PaymentMethodId, PaymentMethodRepository,
    RepoError, UserId,
};

/// In-memory repository implementation.
#[derive(Debug, Default)]
pub struct MemoryRepo {
    orders: DashMap<OrderId, Order>,
    payment_methods: DashMap<PaymentMethodId, PaymentMethod>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for MemoryRepo {
    async fn insert_order(&self, order: &Order) -> Result<(), RepoError> {
        match self.orders.entry(order.id()) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!(
                "Order {} already exists",
                order.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(())
            }
        }
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepoError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.is_owned_by(user_id))
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    async fn update_order(&self, order: &Order) -> Result<Order, RepoError> {
        let mut stored = self.orders.get_mut(&order.id()).ok_or(RepoError::NotFound)?;
        if stored.version() != order.version() {
            return Err(RepoError::Conflict(format!(
                "Order {} version {} is stale (current {})",
                order.id(),
                order.version(),
                stored.version()
            )));
        }
        *stored = order.clone().with_next_version();
        Ok(stored.clone())
    }
}

#[async_trait]
impl PaymentMethodRepository for MemoryRepo {
    async fn insert_payment_method(&self, method: &PaymentMethod) -> Result<(), RepoError> {
        match self.payment_methods.entry(method.id) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!(
                "Payment method {} already exists",
                method.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(method.clone());
                Ok(())
            }
        }
    }

    async fn get_payment_method(
        &self,
        id: PaymentMethodId,
    ) -> Result<Option<PaymentMethod>, RepoError> {
        Ok(self.payment_methods.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_payment_methods_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PaymentMethod>, RepoError> {
        let mut methods: Vec<PaymentMethod> = self
            .payment_methods
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        methods.sort_by_key(|m| m.created_at);
        Ok(methods)
    }

    async fn update_payment_method(&self, method: &PaymentMethod) -> Result<(), RepoError> {
        let mut stored = self
            .payment_methods
            .get_mut(&method.id)
            .ok_or(RepoError::NotFound)?;
        *stored = method.clone();
        Ok(())
    }

    async fn mark_payment_method_used(&self, id: PaymentMethodId) -> Result<(), RepoError> {
        let mut stored = self.payment_methods.get_mut(&id).ok_or(RepoError::NotFound)?;
        stored.mark_used();
        Ok(())
    }
}
