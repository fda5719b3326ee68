//! Order Application Service
//!
//! Orchestrates the order lifecycle across the storage ports, the inventory
//! collaborator and the payment gateway.
//! Contains NO infrastructure logic - pure business orchestration.

use std::sync::Arc;

use orders_types::{
    AppError, AuthenticatedUser, CreateOrderRequest, CreatePaymentMethodRequest, DomainError,
    FeeRate, InventoryClient, Money, Order, OrderId, OrderStatus, OrderStore, PaymentGateway,
    PaymentMethod, PaymentMethodId, PaymentStatus, RepoError, UserId,
};

use crate::outbound::SimulatedGateway;

/// How many times an order update is re-read and re-applied after losing a
/// version race before the caller gets `Conflict`.
const MAX_UPDATE_ATTEMPTS: usize = 5;

/// Application service for order operations.
///
/// Generic over the storage adapter `R` and the inventory adapter `I`. Both
/// are injected at compile time so tests can use in-memory doubles.
pub struct OrderService<R, I>
where
    R: OrderStore,
    I: InventoryClient,
{
    repo: R,
    inventory: I,
    gateway: Arc<dyn PaymentGateway>,
    fee_rate: FeeRate,
}

impl<R, I> OrderService<R, I>
where
    R: OrderStore,
    I: InventoryClient,
{
    /// Creates a new order service charging through the simulated gateway.
    pub fn new(repo: R, inventory: I, fee_rate: FeeRate) -> Self {
        Self {
            repo,
            inventory,
            gateway: Arc::new(SimulatedGateway),
            fee_rate,
        }
    }

    /// Replaces the payment gateway.
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Returns a reference to the inventory client.
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn fee_rate(&self) -> FeeRate {
        self.fee_rate
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Order Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Places an order, reserving stock in the inventory service.
    ///
    /// The inventory decrement and the order insert are not one transaction:
    /// if the insert fails, the decrement is reverted by writing back the
    /// quantity read at the start of the call.
    #[tracing::instrument(skip(self, req), fields(user_id = %user_id, product_id = %req.product_id, quantity = req.quantity))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        req: CreateOrderRequest,
    ) -> Result<Order, AppError> {
        if req.quantity == 0 {
            return Err(AppError::BadRequest(
                "Quantity must be greater than zero".into(),
            ));
        }

        if let Some(method_id) = req.payment_method_id {
            let method = self.find_payment_method(method_id).await?;
            method.ensure_owner(user_id)?;
            if !method.is_active {
                return Err(AppError::BadRequest("Payment method is inactive".into()));
            }
        }

        let product = self.inventory.fetch_product(&req.product_id).await?;

        if product.quantity < req.quantity {
            tracing::warn!(
                available = product.quantity,
                "Rejecting order: insufficient stock"
            );
            return Err(DomainError::InsufficientStock {
                available: product.quantity,
                requested: req.quantity,
            }
            .into());
        }

        let order = Order::place(
            req.product_id.clone(),
            user_id,
            req.quantity,
            product.price,
            self.fee_rate,
            req.payment_method_id,
        )?;

        self.inventory
            .adjust_quantity(&req.product_id, product.quantity - req.quantity)
            .await?;

        if let Err(e) = self.repo.insert_order(&order).await {
            tracing::warn!(order_id = %order.id(), error = %e, "Order insert failed, restoring inventory");
            if let Err(restore) = self
                .inventory
                .adjust_quantity(&req.product_id, product.quantity)
                .await
            {
                tracing::error!(
                    product_id = %req.product_id,
                    reserved = req.quantity,
                    error = %restore,
                    "Failed to restore inventory after order insert failure"
                );
            }
            return Err(e.into());
        }

        tracing::info!(order_id = %order.id(), total = %order.total(), "Order created");
        Ok(order)
    }

    /// Gets an order owned by `user_id`.
    pub async fn get_order(&self, order_id: OrderId, user_id: UserId) -> Result<Order, AppError> {
        let order = self.find_order(order_id).await?;
        if !order.is_owned_by(user_id) {
            return Err(AppError::Forbidden(
                "Not authorized to view this order".into(),
            ));
        }
        Ok(order)
    }

    /// Lists the orders of `user_id`, newest first.
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, AppError> {
        self.repo
            .list_orders_for_user(user_id)
            .await
            .map_err(Into::into)
    }

    /// Charges an order owned by `user_id`.
    ///
    /// The attempt is claimed first (`payment_status = processing`) so that a
    /// concurrent attempt on the same order fails instead of charging twice.
    /// Every outcome after the claim ends in `completed` or `failed`: a
    /// declined charge, an order that left `pending` during the charge, or a
    /// store that could not record the result are all returned as
    /// `PaymentFailed`.
    #[tracing::instrument(skip(self), fields(order_id = %order_id, user_id = %user_id))]
    pub async fn process_payment(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Order, AppError> {
        let order = self.find_order(order_id).await?;
        if !order.is_owned_by(user_id) {
            return Err(AppError::Forbidden(
                "Not authorized to process payment for this order".into(),
            ));
        }

        let method = match order.payment_method_id() {
            Some(method_id) => {
                let method = self.find_payment_method(method_id).await?;
                method.ensure_owner(user_id)?;
                Some(method)
            }
            None => None,
        };

        let claimed = self
            .mutate_order(order_id, |order| order.begin_payment())
            .await?;

        if let Err(gateway_err) = self.gateway.charge(&claimed, method.as_ref()).await {
            let reason = gateway_err.to_string();
            tracing::warn!(reason = %reason, "Payment failed");
            return Err(self.record_payment_failure(order_id, reason).await);
        }

        let settled = self
            .mutate_order(order_id, |order| {
                if order.status() == OrderStatus::Pending {
                    order.complete_payment()
                } else {
                    order.fail_payment(format!(
                        "Order was {} while the payment was processed",
                        order.status()
                    ))
                }
            })
            .await;

        match settled {
            Ok(order) if order.payment_status() == PaymentStatus::Completed => {
                if let Some(method) = method {
                    if let Err(e) = self.repo.mark_payment_method_used(method.id).await {
                        tracing::warn!(error = %e, "Failed to record payment method usage");
                    }
                }
                tracing::info!(total = %order.total(), "Payment completed");
                Ok(order)
            }
            Ok(order) => {
                let reason = order
                    .payment_error()
                    .unwrap_or("Payment could not be completed")
                    .to_string();
                tracing::warn!(reason = %reason, status = %order.status(), "Charged order left pending");
                Err(AppError::PaymentFailed(reason))
            }
            Err(e) => {
                let reason = format!("Payment result could not be recorded: {}", e);
                tracing::error!(error = %e, "Failed to store completed payment");
                Err(self.record_payment_failure(order_id, reason).await)
            }
        }
    }

    /// Closes the payment claim as failed and returns the error for the caller.
    ///
    /// If even this write fails the claim stays `processing` until it expires.
    async fn record_payment_failure(&self, order_id: OrderId, reason: String) -> AppError {
        if let Err(e) = self
            .mutate_order(order_id, |order| order.fail_payment(reason.clone()))
            .await
        {
            tracing::error!(error = %e, "Failed to record payment failure");
        }
        AppError::PaymentFailed(reason)
    }

    /// Refunds a paid order (admin only). `amount` defaults to the order total.
    #[tracing::instrument(skip(self, admin), fields(order_id = %order_id, admin_id = %admin.id))]
    pub async fn refund_order(
        &self,
        order_id: OrderId,
        amount: Option<i64>,
        reason: &str,
        admin: &AuthenticatedUser,
    ) -> Result<Order, AppError> {
        admin.ensure_admin("process refunds")?;

        let amount = match amount {
            Some(minor) => Some(
                Money::new(minor)
                    .map_err(|_| AppError::BadRequest("Refund amount cannot be negative".into()))?,
            ),
            None => None,
        };

        let order = self
            .mutate_order(order_id, |order| order.refund(amount, reason).map(|_| ()))
            .await?;

        tracing::info!(refund_amount = ?order.refund_amount().map(|m| m.amount()), "Refund processed");
        Ok(order)
    }

    /// Overwrites the status of an order (admin only), bypassing the lifecycle
    /// guards.
    #[tracing::instrument(skip(self, admin, note), fields(order_id = %order_id, status = %status, admin_id = %admin.id))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        note: Option<String>,
        admin: &AuthenticatedUser,
    ) -> Result<Order, AppError> {
        admin.ensure_admin("update order status")?;

        self.mutate_order(order_id, |order| {
            order.force_status(status, note.clone());
            Ok(())
        })
        .await
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Order, AppError> {
        self.repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {}", order_id)))
    }

    /// Loads the order, applies `apply` and stores it with a version check,
    /// re-reading and re-applying when another request updated it first.
    ///
    /// A domain error from `apply` is returned as-is and nothing is written.
    async fn mutate_order<F>(&self, order_id: OrderId, mut apply: F) -> Result<Order, AppError>
    where
        F: FnMut(&mut Order) -> Result<(), DomainError>,
    {
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let mut order = self.find_order(order_id).await?;
            apply(&mut order)?;

            match self.repo.update_order(&order).await {
                Ok(stored) => return Ok(stored),
                Err(RepoError::Conflict(msg)) => {
                    tracing::debug!(attempt, %msg, "Order changed concurrently, retrying");
                }
                Err(RepoError::NotFound) => {
                    return Err(AppError::NotFound(format!("Order {}", order_id)));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Conflict(format!(
            "Order {} is being modified concurrently",
            order_id
        )))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payment Method Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Stores a new payment method for `user_id`.
    ///
    /// A new default supersedes every older default of the user. The method is
    /// inserted before older defaults are cleared, so concurrent default
    /// creations settle on the newest one.
    #[tracing::instrument(skip(self, req), fields(user_id = %user_id, method_type = %req.method_type))]
    pub async fn create_payment_method(
        &self,
        user_id: UserId,
        req: CreatePaymentMethodRequest,
    ) -> Result<PaymentMethod, AppError> {
        let mut method = PaymentMethod::new(user_id, req.method_type, req.details, req.is_default)?;
        self.repo.insert_payment_method(&method).await?;

        if method.is_default {
            let mut superseded = false;
            for mut existing in self.repo.list_payment_methods_for_user(user_id).await? {
                if existing.id == method.id || !existing.is_default {
                    continue;
                }
                if is_newer(&existing, &method) {
                    superseded = true;
                } else {
                    existing.clear_default();
                    self.repo.update_payment_method(&existing).await?;
                }
            }
            if superseded {
                tracing::debug!(payment_method_id = %method.id, "Newer default exists");
                method.clear_default();
                self.repo.update_payment_method(&method).await?;
            }
        }

        Ok(method)
    }

    /// Lists the active payment methods of `user_id`.
    pub async fn list_payment_methods(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PaymentMethod>, AppError> {
        let methods = self.repo.list_payment_methods_for_user(user_id).await?;
        Ok(methods.into_iter().filter(|m| m.is_active).collect())
    }

    /// Gets a payment method owned by `user_id`.
    pub async fn get_payment_method(
        &self,
        method_id: PaymentMethodId,
        user_id: UserId,
    ) -> Result<PaymentMethod, AppError> {
        let method = self.find_payment_method(method_id).await?;
        method.ensure_owner(user_id)?;
        Ok(method)
    }

    /// Soft-deletes a payment method; only its owner may do so.
    #[tracing::instrument(skip(self), fields(payment_method_id = %method_id, user_id = %user_id))]
    pub async fn delete_payment_method(
        &self,
        method_id: PaymentMethodId,
        user_id: UserId,
    ) -> Result<(), AppError> {
        let mut method = self.find_payment_method(method_id).await?;
        method.deactivate(user_id)?;
        self.repo.update_payment_method(&method).await?;
        Ok(())
    }

    async fn find_payment_method(&self, id: PaymentMethodId) -> Result<PaymentMethod, AppError> {
        self.repo
            .get_payment_method(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment method".into()))
    }
}

/// Orders payment methods by creation time, then id.
fn is_newer(a: &PaymentMethod, b: &PaymentMethod) -> bool {
    (a.created_at, a.id.as_uuid()) > (b.created_at, b.id.as_uuid())
}
