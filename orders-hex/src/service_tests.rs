//! OrderService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use orders_types::{
        AppError, AuthenticatedUser, CreateOrderRequest, CreatePaymentMethodRequest, FeeRate,
        GatewayError, InventoryClient, InventoryError, Money, Order, OrderId, OrderRepository,
        OrderStatus, PaymentGateway, PaymentMethod, PaymentMethodId, PaymentMethodRepository,
        PaymentStatus, ProductId, ProductSnapshot, RepoError, UserId,
    };

    use crate::OrderService;

    /// Simple in-memory repository for testing the service layer.
    #[derive(Default)]
    pub struct MockRepo {
        orders: Mutex<HashMap<OrderId, Order>>,
        methods: Mutex<HashMap<PaymentMethodId, PaymentMethod>>,
        fail_inserts: AtomicBool,
        /// Number of upcoming `update_order` calls that report a lost version race.
        forced_conflicts: Arc<AtomicUsize>,
    }

    impl MockRepo {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl OrderRepository for MockRepo {
        async fn insert_order(&self, order: &Order) -> Result<(), RepoError> {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(RepoError::Database("disk full".into()));
            }
            self.orders
                .lock()
                .unwrap()
                .insert(order.id(), order.clone());
            Ok(())
        }

        async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
            let order = self.orders.lock().unwrap().get(&id).cloned();
            // let concurrent callers read the same version
            tokio::task::yield_now().await;
            Ok(order)
        }

        async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepoError> {
            let mut orders: Vec<Order> = self
                .orders
                .lock()
                .unwrap()
                .values()
                .filter(|o| o.is_owned_by(user_id))
                .cloned()
                .collect();
            orders.sort_by_key(|o| std::cmp::Reverse(o.created_at()));
            Ok(orders)
        }

        async fn update_order(&self, order: &Order) -> Result<Order, RepoError> {
            if self
                .forced_conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(RepoError::Conflict("forced".into()));
            }

            let mut orders = self.orders.lock().unwrap();
            let stored = orders.get_mut(&order.id()).ok_or(RepoError::NotFound)?;
            if stored.version() != order.version() {
                return Err(RepoError::Conflict("version mismatch".into()));
            }
            *stored = order.clone().with_next_version();
            Ok(stored.clone())
        }
    }

    #[async_trait]
    impl PaymentMethodRepository for MockRepo {
        async fn insert_payment_method(&self, method: &PaymentMethod) -> Result<(), RepoError> {
            self.methods
                .lock()
                .unwrap()
                .insert(method.id, method.clone());
            Ok(())
        }

        async fn get_payment_method(
            &self,
            id: PaymentMethodId,
        ) -> Result<Option<PaymentMethod>, RepoError> {
            Ok(self.methods.lock().unwrap().get(&id).cloned())
        }

        async fn list_payment_methods_for_user(
            &self,
            user_id: UserId,
        ) -> Result<Vec<PaymentMethod>, RepoError> {
            let mut methods: Vec<PaymentMethod> = self
                .methods
                .lock()
                .unwrap()
                .values()
                .filter(|m| m.user_id == user_id)
                .cloned()
                .collect();
            methods.sort_by_key(|m| m.created_at);
            Ok(methods)
        }

        async fn update_payment_method(&self, method: &PaymentMethod) -> Result<(), RepoError> {
            let mut methods = self.methods.lock().unwrap();
            let stored = methods.get_mut(&method.id).ok_or(RepoError::NotFound)?;
            *stored = method.clone();
            Ok(())
        }

        async fn mark_payment_method_used(&self, id: PaymentMethodId) -> Result<(), RepoError> {
            let mut methods = self.methods.lock().unwrap();
            let stored = methods.get_mut(&id).ok_or(RepoError::NotFound)?;
            stored.mark_used();
            Ok(())
        }
    }

    /// Inventory double holding products in memory and recording writes.
    #[derive(Default)]
    pub struct MockInventory {
        products: Mutex<HashMap<ProductId, ProductSnapshot>>,
        writes: Mutex<Vec<(ProductId, u32)>>,
        unavailable: AtomicBool,
    }

    impl MockInventory {
        pub fn with_product(id: &str, price: i64, quantity: u32) -> Self {
            let inventory = Self::default();
            inventory.products.lock().unwrap().insert(
                ProductId::new(id),
                ProductSnapshot {
                    price: Money::new(price).unwrap(),
                    quantity,
                },
            );
            inventory
        }

        pub fn quantity(&self, id: &str) -> u32 {
            self.products.lock().unwrap()[&ProductId::new(id)].quantity
        }

        pub fn writes(&self) -> Vec<(ProductId, u32)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InventoryClient for MockInventory {
        async fn fetch_product(
            &self,
            product_id: &ProductId,
        ) -> Result<ProductSnapshot, InventoryError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(InventoryError::Unavailable("request timed out".into()));
            }
            self.products
                .lock()
                .unwrap()
                .get(product_id)
                .cloned()
                .ok_or_else(|| InventoryError::NotFound(product_id.clone()))
        }

        async fn adjust_quantity(
            &self,
            product_id: &ProductId,
            new_quantity: u32,
        ) -> Result<(), InventoryError> {
            let mut products = self.products.lock().unwrap();
            let product = products
                .get_mut(product_id)
                .ok_or_else(|| InventoryError::NotFound(product_id.clone()))?;
            product.quantity = new_quantity;
            self.writes
                .lock()
                .unwrap()
                .push((product_id.clone(), new_quantity));
            Ok(())
        }
    }

    struct DecliningGateway;

    #[async_trait]
    impl PaymentGateway for DecliningGateway {
        async fn charge(
            &self,
            _order: &Order,
            _method: Option<&PaymentMethod>,
        ) -> Result<(), GatewayError> {
            Err(GatewayError::Declined("card expired".into()))
        }
    }

    /// Gateway that parks every charge until the test releases it.
    #[derive(Default)]
    struct BlockingGateway {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PaymentGateway for BlockingGateway {
        async fn charge(
            &self,
            _order: &Order,
            _method: Option<&PaymentMethod>,
        ) -> Result<(), GatewayError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    /// Gateway whose first charge makes the next order updates lose their
    /// version race.
    struct ContendedGateway {
        conflicts: Arc<AtomicUsize>,
        count: AtomicUsize,
        decline: bool,
    }

    #[async_trait]
    impl PaymentGateway for ContendedGateway {
        async fn charge(
            &self,
            _order: &Order,
            _method: Option<&PaymentMethod>,
        ) -> Result<(), GatewayError> {
            let count = self.count.swap(0, Ordering::SeqCst);
            self.conflicts.store(count, Ordering::SeqCst);
            if self.decline {
                return Err(GatewayError::Declined("card expired".into()));
            }
            Ok(())
        }
    }

    type TestService = OrderService<MockRepo, MockInventory>;

    fn contended_service(count: usize, decline: bool) -> TestService {
        let repo = MockRepo::new();
        let conflicts = repo.forced_conflicts.clone();
        OrderService::new(
            repo,
            MockInventory::with_product("P1", 1000, 10),
            FeeRate::default(),
        )
        .with_gateway(Arc::new(ContendedGateway {
            conflicts,
            count: AtomicUsize::new(count),
            decline,
        }))
    }

    fn create_service() -> TestService {
        OrderService::new(
            MockRepo::new(),
            MockInventory::with_product("P1", 1000, 10),
            FeeRate::default(),
        )
    }

    fn customer() -> UserId {
        UserId::new(1)
    }

    fn admin() -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(99),
            is_verified: true,
            is_admin: true,
        }
    }

    fn order_request(quantity: u32) -> CreateOrderRequest {
        CreateOrderRequest {
            product_id: ProductId::new("P1"),
            quantity,
            payment_method_id: None,
        }
    }

    async fn paid_order(service: &TestService) -> Order {
        let order = service
            .create_order(customer(), order_request(2))
            .await
            .unwrap();
        service
            .process_payment(order.id(), customer())
            .await
            .unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Create
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_order_prices_and_reserves_stock() {
        let service = create_service();

        let order = service
            .create_order(customer(), order_request(2))
            .await
            .unwrap();

        assert_eq!(order.unit_price().amount(), 1000);
        assert_eq!(order.fee().amount(), 100);
        assert_eq!(order.total().amount(), 2100);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.notes().len(), 1);
        assert_eq!(order.notes()[0].message, "Order created");
        assert_eq!(service.inventory().quantity("P1"), 8);
    }

    #[tokio::test]
    async fn test_create_order_with_insufficient_stock_leaves_inventory_untouched() {
        let service = OrderService::new(
            MockRepo::new(),
            MockInventory::with_product("P1", 1000, 3),
            FeeRate::default(),
        );

        let result = service.create_order(customer(), order_request(5)).await;

        assert!(matches!(
            result,
            Err(AppError::InsufficientStock {
                available: 3,
                requested: 5
            })
        ));
        assert_eq!(service.inventory().quantity("P1"), 3);
        assert!(service.inventory().writes().is_empty());
        assert!(service.list_orders(customer()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_for_whole_stock_succeeds() {
        let service = create_service();

        service
            .create_order(customer(), order_request(10))
            .await
            .unwrap();

        assert_eq!(service.inventory().quantity("P1"), 0);
    }

    #[tokio::test]
    async fn test_create_order_zero_quantity_rejected() {
        let service = create_service();

        let result = service.create_order(customer(), order_request(0)).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(service.inventory().writes().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_unknown_product() {
        let service = create_service();
        let req = CreateOrderRequest {
            product_id: ProductId::new("P404"),
            quantity: 1,
            payment_method_id: None,
        };

        let result = service.create_order(customer(), req).await;

        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "Product P404"));
    }

    #[tokio::test]
    async fn test_create_order_inventory_unavailable() {
        let service = create_service();
        service.inventory().unavailable.store(true, Ordering::SeqCst);

        let result = service.create_order(customer(), order_request(1)).await;

        assert!(matches!(result, Err(AppError::Unavailable(_))));
        assert!(service.list_orders(customer()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_insert_failure_restores_inventory() {
        let service = create_service();
        service.repo().fail_inserts.store(true, Ordering::SeqCst);

        let result = service.create_order(customer(), order_request(4)).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(service.inventory().quantity("P1"), 10);
        assert_eq!(
            service.inventory().writes(),
            vec![(ProductId::new("P1"), 6), (ProductId::new("P1"), 10)]
        );
    }

    #[tokio::test]
    async fn test_create_order_with_foreign_payment_method_forbidden() {
        let service = create_service();
        let method = service
            .create_payment_method(UserId::new(2), card_request(false))
            .await
            .unwrap();
        let req = CreateOrderRequest {
            payment_method_id: Some(method.id),
            ..order_request(1)
        };

        let result = service.create_order(customer(), req).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(service.inventory().quantity("P1"), 10);
    }

    #[tokio::test]
    async fn test_create_order_with_deleted_payment_method_rejected() {
        let service = create_service();
        let method = service
            .create_payment_method(customer(), card_request(false))
            .await
            .unwrap();
        service
            .delete_payment_method(method.id, customer())
            .await
            .unwrap();
        let req = CreateOrderRequest {
            payment_method_id: Some(method.id),
            ..order_request(1)
        };

        let result = service.create_order(customer(), req).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Read
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_get_order_of_other_user_forbidden() {
        let service = create_service();
        let order = service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();

        let result = service.get_order(order.id(), UserId::new(2)).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_missing_order_not_found() {
        let service = create_service();

        let result = service.get_order(OrderId::new(), customer()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_orders_only_returns_own_orders() {
        let service = create_service();
        service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();
        service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();
        service
            .create_order(UserId::new(2), order_request(1))
            .await
            .unwrap();

        let orders = service.list_orders(customer()).await.unwrap();

        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.is_owned_by(customer())));
        assert!(orders[0].created_at() >= orders[1].created_at());
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payment
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_process_payment_marks_order_paid() {
        let service = create_service();

        let order = paid_order(&service).await;

        assert_eq!(order.status(), OrderStatus::Paid);
        assert_eq!(order.payment_status(), PaymentStatus::Completed);
        assert_eq!(order.notes().len(), 2);
        assert_eq!(order.notes()[1].message, "Payment completed successfully");
    }

    #[tokio::test]
    async fn test_process_payment_twice_rejected() {
        let service = create_service();
        let order = paid_order(&service).await;

        let result = service.process_payment(order.id(), customer()).await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
        let stored = service.get_order(order.id(), customer()).await.unwrap();
        assert_eq!(stored.notes().len(), 2);
    }

    #[tokio::test]
    async fn test_process_payment_by_other_user_forbidden() {
        let service = create_service();
        let order = service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();

        let result = service.process_payment(order.id(), UserId::new(2)).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_declined_payment_is_recorded_on_order() {
        let service = create_service().with_gateway(Arc::new(DecliningGateway));
        let order = service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();

        let result = service.process_payment(order.id(), customer()).await;

        assert!(matches!(result, Err(AppError::PaymentFailed(_))));
        let stored = service.get_order(order.id(), customer()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Pending);
        assert_eq!(stored.payment_status(), PaymentStatus::Failed);
        assert_eq!(
            stored.payment_error(),
            Some("Payment declined: card expired")
        );
        assert_eq!(stored.notes().len(), 2);
        assert!(stored.notes()[1].message.starts_with("Payment failed:"));
    }

    #[tokio::test]
    async fn test_cancel_during_charge_keeps_order_cancelled() {
        let gateway = Arc::new(BlockingGateway::default());
        let service = create_service().with_gateway(gateway.clone());
        let order = service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();

        let cancel = async {
            gateway.entered.notified().await;
            service
                .update_order_status(order.id(), OrderStatus::Cancelled, None, &admin())
                .await
                .unwrap();
            gateway.release.notify_one();
        };
        let (result, ()) = tokio::join!(service.process_payment(order.id(), customer()), cancel);

        assert!(matches!(result, Err(AppError::PaymentFailed(_))));
        let stored = service.get_order(order.id(), customer()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Cancelled);
        assert_eq!(stored.payment_status(), PaymentStatus::Failed);
        assert_eq!(stored.notes().len(), 3);
        assert!(stored.notes()[2].message.starts_with("Payment failed:"));
    }

    #[tokio::test]
    async fn test_unrecorded_payment_result_is_closed_as_failed() {
        let service = contended_service(5, false);
        let order = service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();

        let result = service.process_payment(order.id(), customer()).await;

        assert!(matches!(result, Err(AppError::PaymentFailed(_))));
        let stored = service.get_order(order.id(), customer()).await.unwrap();
        assert_eq!(stored.payment_status(), PaymentStatus::Failed);
        assert_eq!(stored.status(), OrderStatus::Pending);
        assert_eq!(stored.notes().len(), 2);

        // the order is not stuck: a later attempt goes through
        let paid = service
            .process_payment(order.id(), customer())
            .await
            .unwrap();
        assert_eq!(paid.status(), OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_unrecorded_decline_still_reports_payment_failed() {
        let service = contended_service(100, true);
        let order = service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();

        let result = service.process_payment(order.id(), customer()).await;

        assert!(matches!(
            result,
            Err(AppError::PaymentFailed(msg)) if msg == "Payment declined: card expired"
        ));
    }

    #[tokio::test]
    async fn test_delete_during_charge_stays_deleted() {
        let gateway = Arc::new(BlockingGateway::default());
        let service = create_service().with_gateway(gateway.clone());
        let method = service
            .create_payment_method(customer(), card_request(true))
            .await
            .unwrap();
        let req = CreateOrderRequest {
            payment_method_id: Some(method.id),
            ..order_request(1)
        };
        let order = service.create_order(customer(), req).await.unwrap();

        let delete = async {
            gateway.entered.notified().await;
            service
                .delete_payment_method(method.id, customer())
                .await
                .unwrap();
            gateway.release.notify_one();
        };
        let (result, ()) = tokio::join!(service.process_payment(order.id(), customer()), delete);

        assert_eq!(result.unwrap().status(), OrderStatus::Paid);
        let stored = service
            .get_payment_method(method.id, customer())
            .await
            .unwrap();
        assert!(!stored.is_active);
        assert!(!stored.is_default);
        assert!(stored.last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_payment_records_method_usage() {
        let service = create_service();
        let method = service
            .create_payment_method(customer(), card_request(true))
            .await
            .unwrap();
        let req = CreateOrderRequest {
            payment_method_id: Some(method.id),
            ..order_request(1)
        };
        let order = service.create_order(customer(), req).await.unwrap();

        service
            .process_payment(order.id(), customer())
            .await
            .unwrap();

        let method = service
            .get_payment_method(method.id, customer())
            .await
            .unwrap();
        assert!(method.last_used_at.is_some());
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Refund
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_full_lifecycle_create_pay_refund() {
        let service = create_service();
        let order = paid_order(&service).await;

        let refunded = service
            .refund_order(order.id(), None, "changed mind", &admin())
            .await
            .unwrap();

        assert_eq!(refunded.status(), OrderStatus::Refunded);
        assert_eq!(refunded.refund_amount(), Some(Money::new(2100).unwrap()));
        assert_eq!(refunded.notes().len(), 3);
        assert_eq!(
            refunded.notes()[2].message,
            "Refund processed: 21.00. Reason: changed mind"
        );
    }

    #[tokio::test]
    async fn test_refund_pending_order_rejected() {
        let service = create_service();
        let order = service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();

        let result = service
            .refund_order(order.id(), None, "oops", &admin())
            .await;

        assert!(matches!(
            result,
            Err(AppError::InvalidState(msg)) if msg == "Order must be paid to process refund"
        ));
    }

    #[tokio::test]
    async fn test_refund_more_than_total_leaves_order_unchanged() {
        let service = create_service();
        let order = paid_order(&service).await;

        let result = service
            .refund_order(order.id(), Some(2101), "too much", &admin())
            .await;

        assert!(matches!(
            result,
            Err(AppError::InvalidAmount {
                requested: 2101,
                total: 2100
            })
        ));
        let stored = service.get_order(order.id(), customer()).await.unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn test_partial_refund_records_amount() {
        let service = create_service();
        let order = paid_order(&service).await;

        let refunded = service
            .refund_order(order.id(), Some(500), "damaged box", &admin())
            .await
            .unwrap();

        assert_eq!(refunded.refund_amount(), Some(Money::new(500).unwrap()));
        assert_eq!(refunded.status(), OrderStatus::Refunded);
    }

    #[tokio::test]
    async fn test_refund_requires_admin() {
        let service = create_service();
        let order = paid_order(&service).await;
        let user = AuthenticatedUser {
            id: customer(),
            is_verified: true,
            is_admin: false,
        };

        let result = service.refund_order(order.id(), None, "mine", &user).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_negative_refund_amount_rejected() {
        let service = create_service();
        let order = paid_order(&service).await;

        let result = service
            .refund_order(order.id(), Some(-1), "negative", &admin())
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_concurrent_refunds_exactly_one_succeeds() {
        let service = create_service();
        let order = paid_order(&service).await;
        let admin = admin();

        let (a, b) = tokio::join!(
            service.refund_order(order.id(), None, "first", &admin),
            service.refund_order(order.id(), None, "second", &admin),
        );

        let outcomes = [a, b];
        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(AppError::InvalidState(_))))
        );

        let stored = service.get_order(order.id(), customer()).await.unwrap();
        assert_eq!(stored.notes().len(), 3);
    }

    #[tokio::test]
    async fn test_update_retries_after_lost_version_race() {
        let service = create_service();
        let order = paid_order(&service).await;
        service.repo().forced_conflicts.store(2, Ordering::SeqCst);

        let refunded = service
            .refund_order(order.id(), None, "retry", &admin())
            .await
            .unwrap();

        assert_eq!(refunded.status(), OrderStatus::Refunded);
        assert_eq!(refunded.notes().len(), 3);
    }

    #[tokio::test]
    async fn test_update_gives_up_after_repeated_conflicts() {
        let service = create_service();
        let order = paid_order(&service).await;
        service.repo().forced_conflicts.store(100, Ordering::SeqCst);

        let result = service
            .refund_order(order.id(), None, "contended", &admin())
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        service.repo().forced_conflicts.store(0, Ordering::SeqCst);
        let stored = service.get_order(order.id(), customer()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Paid);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Status override
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_update_status_writes_default_note() {
        let service = create_service();
        let order = service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();

        let updated = service
            .update_order_status(order.id(), OrderStatus::Cancelled, None, &admin())
            .await
            .unwrap();

        assert_eq!(updated.status(), OrderStatus::Cancelled);
        assert_eq!(
            updated.notes().last().unwrap().message,
            "Status changed from pending to cancelled"
        );
    }

    #[tokio::test]
    async fn test_update_status_can_leave_terminal_state() {
        let service = create_service();
        let order = paid_order(&service).await;
        service
            .refund_order(order.id(), None, "returned", &admin())
            .await
            .unwrap();

        let updated = service
            .update_order_status(
                order.id(),
                OrderStatus::Paid,
                Some("refund reversed".into()),
                &admin(),
            )
            .await
            .unwrap();

        assert_eq!(updated.status(), OrderStatus::Paid);
        assert_eq!(updated.notes().last().unwrap().message, "refund reversed");
    }

    #[tokio::test]
    async fn test_update_status_requires_admin() {
        let service = create_service();
        let order = service
            .create_order(customer(), order_request(1))
            .await
            .unwrap();
        let user = AuthenticatedUser {
            id: customer(),
            is_verified: true,
            is_admin: false,
        };

        let result = service
            .update_order_status(order.id(), OrderStatus::Paid, None, &user)
            .await;

        assert!(matches!(
            result,
            Err(AppError::Forbidden(msg)) if msg == "Only administrators can update order status"
        ));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payment methods
    // ─────────────────────────────────────────────────────────────────────────────

    fn card_request(is_default: bool) -> CreatePaymentMethodRequest {
        let mut details = serde_json::Map::new();
        details.insert("last4".into(), serde_json::json!("4242"));
        CreatePaymentMethodRequest {
            method_type: "card".into(),
            details,
            is_default,
        }
    }

    #[tokio::test]
    async fn test_new_default_method_clears_previous_default() {
        let service = create_service();
        let first = service
            .create_payment_method(customer(), card_request(true))
            .await
            .unwrap();
        let second = service
            .create_payment_method(customer(), card_request(true))
            .await
            .unwrap();

        let methods = service.list_payment_methods(customer()).await.unwrap();

        let defaults: Vec<_> = methods.iter().filter(|m| m.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, second.id);
        assert!(methods.iter().any(|m| m.id == first.id && !m.is_default));
    }

    #[tokio::test]
    async fn test_older_default_does_not_override_newer_one() {
        let service = create_service();
        let mut newer =
            PaymentMethod::new(customer(), "paypal".into(), Default::default(), true).unwrap();
        newer.created_at += chrono::Duration::minutes(1);
        service.repo().insert_payment_method(&newer).await.unwrap();

        let created = service
            .create_payment_method(customer(), card_request(true))
            .await
            .unwrap();

        assert!(!created.is_default);
        let methods = service.list_payment_methods(customer()).await.unwrap();
        let defaults: Vec<_> = methods.iter().filter(|m| m.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, newer.id);
    }

    #[tokio::test]
    async fn test_deleted_method_hidden_from_listing() {
        let service = create_service();
        let method = service
            .create_payment_method(customer(), card_request(false))
            .await
            .unwrap();

        service
            .delete_payment_method(method.id, customer())
            .await
            .unwrap();

        assert!(
            service
                .list_payment_methods(customer())
                .await
                .unwrap()
                .is_empty()
        );
        let stored = service
            .get_payment_method(method.id, customer())
            .await
            .unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_delete_method_of_other_user_forbidden() {
        let service = create_service();
        let method = service
            .create_payment_method(customer(), card_request(false))
            .await
            .unwrap();

        let result = service
            .delete_payment_method(method.id, UserId::new(2))
            .await;

        assert!(matches!(
            result,
            Err(AppError::Forbidden(msg)) if msg == "Not authorized to delete this payment method"
        ));
    }

    #[tokio::test]
    async fn test_blank_method_type_rejected() {
        let service = create_service();
        let req = CreatePaymentMethodRequest {
            method_type: "  ".into(),
            ..card_request(false)
        };

        let result = service.create_payment_method(customer(), req).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
