//! Order lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::{error, info, instrument};

use crate::{
    domain::{
        events::{EventBus, ShopEvent},
        orders::{
            errors::OrderLifecycleError,
            records::{OrderRecord, OrderStatus, OrderUuid},
            repository::OrdersRepository,
        },
        stock::{StockLedger, data::StockLine},
        users::UserUuid,
    },
    storage::StorageError,
};

#[derive(Clone)]
pub struct DefaultOrderLifecycle {
    orders: Arc<dyn OrdersRepository>,
    ledger: Arc<StockLedger>,
    events: Arc<dyn EventBus>,
}

impl DefaultOrderLifecycle {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrdersRepository>,
        ledger: Arc<StockLedger>,
        events: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            orders,
            ledger,
            events,
        }
    }

    /// Move `order` to `next` if its current status allows it.
    ///
    /// The write is conditional on the status read here, so of two racing
    /// transitions out of the same status only one succeeds; the loser sees
    /// the status the winner left behind.
    async fn transition(
        &self,
        order: &OrderRecord,
        next: OrderStatus,
    ) -> Result<OrderRecord, OrderLifecycleError> {
        if !order.status.can_transition_to(next) {
            return Err(OrderLifecycleError::InvalidStatusTransition {
                current: order.status,
            });
        }

        match self
            .orders
            .compare_and_set_status(order.uuid, order.status, next)
            .await
        {
            Ok(updated) => Ok(updated),
            Err(StorageError::Conflict) => {
                let current = self.orders.get_order(order.uuid).await?.status;

                Err(OrderLifecycleError::InvalidStatusTransition { current })
            }
            Err(source) => Err(source.into()),
        }
    }
}

#[async_trait]
impl OrderLifecycle for DefaultOrderLifecycle {
    #[instrument(skip(self), fields(user_uuid = %user, order_uuid = %order))]
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrderLifecycleError> {
        let record = self.orders.get_order(order).await?;

        if record.user_uuid != user {
            return Err(OrderLifecycleError::NotOwner);
        }

        let cancelled = self.transition(&record, OrderStatus::Cancelled).await?;

        let lines: Vec<StockLine> = cancelled
            .items
            .iter()
            .map(|item| StockLine::new(item.product_uuid, item.quantity))
            .collect();

        self.ledger.release_many(&lines).await.map_err(|source| {
            error!("cancelled order could not restore stock: {source}");

            OrderLifecycleError::Stock(source)
        })?;

        self.events.publish(ShopEvent::OrderCancelled {
            user_uuid: user,
            order_uuid: order,
        });

        info!(items = lines.len(), "cancelled order");

        Ok(cancelled)
    }

    #[instrument(skip(self), fields(order_uuid = %order))]
    async fn ship_order(&self, order: OrderUuid) -> Result<OrderRecord, OrderLifecycleError> {
        let record = self.orders.get_order(order).await?;

        let shipped = self.transition(&record, OrderStatus::Shipped).await?;

        self.events.publish(ShopEvent::OrderShipped { order_uuid: order });

        info!("shipped order");

        Ok(shipped)
    }

    #[instrument(skip(self), fields(order_uuid = %order))]
    async fn deliver_order(&self, order: OrderUuid) -> Result<OrderRecord, OrderLifecycleError> {
        let record = self.orders.get_order(order).await?;

        let delivered = self.transition(&record, OrderStatus::Delivered).await?;

        self.events
            .publish(ShopEvent::OrderDelivered { order_uuid: order });

        info!("delivered order");

        Ok(delivered)
    }
}

#[automock]
#[async_trait]
pub trait OrderLifecycle: Send + Sync {
    /// Cancel one of the user's orders and return its items to stock.
    ///
    /// Only orders still in [`OrderStatus::Processing`] can be cancelled.
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrderLifecycleError>;

    /// Mark a processing order as shipped.
    async fn ship_order(&self, order: OrderUuid) -> Result<OrderRecord, OrderLifecycleError>;

    /// Mark a shipped order as delivered.
    async fn deliver_order(&self, order: OrderUuid) -> Result<OrderRecord, OrderLifecycleError>;
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::CartsService,
            orders::{OrdersService, OrdersServiceError, repository::MockOrdersRepository},
            products::records::ProductUuid,
        },
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn cancel_restores_stock_and_second_cancel_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let a = ctx.create_product(Decimal::ONE, 4).await?;
        let b = ctx.create_product(Decimal::ONE, 2).await?;

        ctx.add_to_cart(user, a, 3).await?;
        ctx.add_to_cart(user, b, 2).await?;

        let order = ctx.checkout(user).await?;

        assert_eq!(ctx.ledger.level(a).await, Some(1));
        assert_eq!(ctx.ledger.level(b).await, Some(0));

        let cancelled = ctx.lifecycle.cancel_order(user, order.uuid).await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(ctx.ledger.level(a).await, Some(4));
        assert_eq!(ctx.ledger.level(b).await, Some(2));

        let again = ctx.lifecycle.cancel_order(user, order.uuid).await;

        assert!(
            matches!(
                again,
                Err(OrderLifecycleError::InvalidStatusTransition {
                    current: OrderStatus::Cancelled
                })
            ),
            "expected InvalidStatusTransition, got {again:?}"
        );
        assert_eq!(ctx.ledger.level(a).await, Some(4));

        Ok(())
    }

    #[tokio::test]
    async fn cancel_by_another_user_is_not_owner() -> TestResult {
        let ctx = TestContext::new();
        let owner = UserUuid::new();
        let product = ctx.create_product(Decimal::ONE, 4).await?;

        ctx.add_to_cart(owner, product, 1).await?;

        let order = ctx.checkout(owner).await?;

        let result = ctx.lifecycle.cancel_order(UserUuid::new(), order.uuid).await;

        assert!(
            matches!(result, Err(OrderLifecycleError::NotOwner)),
            "expected NotOwner, got {result:?}"
        );
        assert_eq!(ctx.ledger.level(product).await, Some(3));

        Ok(())
    }

    #[tokio::test]
    async fn cancel_unknown_order_is_not_found() {
        let ctx = TestContext::new();

        let result = ctx
            .lifecycle
            .cancel_order(UserUuid::new(), OrderUuid::new())
            .await;

        assert!(
            matches!(result, Err(OrderLifecycleError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn shipped_orders_cannot_be_cancelled() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let product = ctx.create_product(Decimal::ONE, 4).await?;

        ctx.add_to_cart(user, product, 1).await?;

        let order = ctx.checkout(user).await?;

        let shipped = ctx.lifecycle.ship_order(order.uuid).await?;

        assert_eq!(shipped.status, OrderStatus::Shipped);

        let result = ctx.lifecycle.cancel_order(user, order.uuid).await;

        assert!(
            matches!(
                result,
                Err(OrderLifecycleError::InvalidStatusTransition {
                    current: OrderStatus::Shipped
                })
            ),
            "expected InvalidStatusTransition, got {result:?}"
        );

        let delivered = ctx.lifecycle.deliver_order(order.uuid).await?;

        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(ctx.ledger.level(product).await, Some(3));

        Ok(())
    }

    #[tokio::test]
    async fn processing_orders_cannot_be_delivered() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let product = ctx.create_product(Decimal::ONE, 4).await?;

        ctx.add_to_cart(user, product, 1).await?;

        let order = ctx.checkout(user).await?;

        let result = ctx.lifecycle.deliver_order(order.uuid).await;

        assert!(
            matches!(
                result,
                Err(OrderLifecycleError::InvalidStatusTransition {
                    current: OrderStatus::Processing
                })
            ),
            "expected InvalidStatusTransition, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cancellations_release_stock_once() -> TestResult {
        let ctx = Arc::new(TestContext::new());
        let user = UserUuid::new();
        let product = ctx.create_product(Decimal::ONE, 5).await?;

        ctx.add_to_cart(user, product, 3).await?;

        let order = ctx.checkout(user).await?;
        let mut tasks = Vec::new();

        for _ in 0..8 {
            let ctx = Arc::clone(&ctx);

            tasks.push(tokio::spawn(async move {
                ctx.lifecycle.cancel_order(user, order.uuid).await
            }));
        }

        let mut cancelled = 0;

        for task in tasks {
            if task.await?.is_ok() {
                cancelled += 1;
            }
        }

        assert_eq!(cancelled, 1);
        assert_eq!(ctx.ledger.level(product).await, Some(5));

        Ok(())
    }

    #[tokio::test]
    async fn lost_compare_and_set_reports_the_winning_status() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let product = ctx.create_product(Decimal::ONE, 5).await?;

        ctx.add_to_cart(user, product, 1).await?;

        let order = ctx.checkout(user).await?;
        let shipped = OrderRecord {
            status: OrderStatus::Shipped,
            ..order.clone()
        };

        let mut repository = MockOrdersRepository::new();
        let mut reads = vec![shipped, order.clone()];

        repository
            .expect_get_order()
            .times(2)
            .returning(move |_| reads.pop().ok_or(StorageError::RowNotFound));
        repository
            .expect_compare_and_set_status()
            .once()
            .withf(|_, expected, next| {
                *expected == OrderStatus::Processing && *next == OrderStatus::Cancelled
            })
            .return_once(|_, _, _| Err(StorageError::Conflict));
        repository.expect_create_order().never();

        let lifecycle = DefaultOrderLifecycle::new(
            Arc::new(repository),
            Arc::clone(&ctx.ledger),
            ctx.events.clone(),
        );

        let result = lifecycle.cancel_order(user, order.uuid).await;

        assert!(
            matches!(
                result,
                Err(OrderLifecycleError::InvalidStatusTransition {
                    current: OrderStatus::Shipped
                })
            ),
            "expected InvalidStatusTransition, got {result:?}"
        );
        assert_eq!(ctx.ledger.level(product).await, Some(4));

        Ok(())
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Add { product: usize, quantity: u32 },
        Update { quantity: u32 },
        Checkout,
        CancelLatest,
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn stock_is_conserved_under_random_concurrent_traffic() -> TestResult {
        const INITIAL: [u32; 3] = [6, 4, 9];

        let ctx = Arc::new(TestContext::new());
        let mut products: Vec<ProductUuid> = Vec::new();

        for stock in INITIAL {
            products.push(ctx.create_product(Decimal::new(199, 2), stock).await?);
        }

        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut tasks = Vec::new();

        for _ in 0..12 {
            let plan: Vec<Step> = (0..40)
                .map(|_| match rng.gen_range(0..10) {
                    0..=3 => Step::Add {
                        product: rng.gen_range(0..INITIAL.len()),
                        quantity: rng.gen_range(1..=3),
                    },
                    4 => Step::Update {
                        quantity: rng.gen_range(1..=4),
                    },
                    5..=7 => Step::Checkout,
                    _ => Step::CancelLatest,
                })
                .collect();

            let ctx = Arc::clone(&ctx);
            let products = products.clone();
            let user = UserUuid::new();

            tasks.push(tokio::spawn(async move {
                for step in plan {
                    match step {
                        Step::Add { product, quantity } => {
                            if let Some(product) = products.get(product) {
                                drop(ctx.add_to_cart(user, *product, quantity).await);
                            }
                        }
                        Step::Update { quantity } => {
                            let lines = ctx.carts.list_items(user).await?;

                            if let Some(line) = lines.first() {
                                drop(
                                    ctx.carts
                                        .update_quantity(user, line.item.uuid, quantity)
                                        .await,
                                );
                            }
                        }
                        Step::Checkout => match ctx.checkout(user).await {
                            Ok(_)
                            | Err(
                                OrdersServiceError::EmptyCart
                                | OrdersServiceError::InsufficientStock { .. },
                            ) => {}
                            Err(other) => return Err(other.into()),
                        },
                        Step::CancelLatest => {
                            let orders = ctx.orders.list_orders(user).await?;

                            if let Some(order) = orders.first() {
                                drop(ctx.lifecycle.cancel_order(user, order.uuid).await);
                            }
                        }
                    }
                }

                Ok::<_, Box<dyn std::error::Error + Send + Sync>>(user)
            }));
        }

        let mut live = vec![0_u32; INITIAL.len()];

        for task in tasks {
            let user = task.await??;

            for order in ctx.orders.list_orders(user).await? {
                assert_eq!(
                    order.total_amount,
                    order
                        .items
                        .iter()
                        .map(|item| item.line_total())
                        .sum::<Decimal>()
                        .round_dp(2),
                    "total must match its items"
                );

                if order.status == OrderStatus::Cancelled {
                    continue;
                }

                for item in &order.items {
                    let index = products
                        .iter()
                        .position(|product| *product == item.product_uuid)
                        .ok_or("order item for unknown product")?;

                    if let Some(reserved) = live.get_mut(index) {
                        *reserved += item.quantity;
                    }
                }
            }
        }

        for ((product, initial), reserved) in products.iter().zip(INITIAL).zip(live) {
            let available = ctx.ledger.level(*product).await.ok_or("untracked product")?;

            assert_eq!(
                available + reserved,
                initial,
                "stock for {product} must be conserved"
            );
        }

        Ok(())
    }
}
