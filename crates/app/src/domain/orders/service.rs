//! Orders service.
//!
//! Turns a user's cart into an order. Stock for every line is reserved in a
//! single all-or-nothing ledger operation before anything is written, and
//! released again if the order cannot be persisted, so a failed checkout
//! never leaves stock missing.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    domain::{
        carts::{records::CartItemRecord, repository::CartsRepository},
        events::{EventBus, ShopEvent},
        orders::{
            data::NewOrder,
            errors::OrdersServiceError,
            records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderStatus, OrderUuid},
            repository::OrdersRepository,
        },
        products::repository::ProductsRepository,
        stock::{
            StockError, StockLedger,
            data::{Reservation, StockLine},
        },
        users::UserUuid,
    },
    locks::KeyedLocks,
    storage::StorageError,
};

/// Default number of decimal places order totals are rounded to.
pub const DEFAULT_CURRENCY_PRECISION: u32 = 2;

#[derive(Clone)]
pub struct DefaultOrdersService {
    orders: Arc<dyn OrdersRepository>,
    carts: Arc<dyn CartsRepository>,
    products: Arc<dyn ProductsRepository>,
    ledger: Arc<StockLedger>,
    locks: Arc<KeyedLocks<UserUuid>>,
    events: Arc<dyn EventBus>,
    currency_precision: u32,
}

impl DefaultOrdersService {
    /// `locks` must be shared with the carts service.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrdersRepository>,
        carts: Arc<dyn CartsRepository>,
        products: Arc<dyn ProductsRepository>,
        ledger: Arc<StockLedger>,
        locks: Arc<KeyedLocks<UserUuid>>,
        events: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            orders,
            carts,
            products,
            ledger,
            locks,
            events,
            currency_precision: DEFAULT_CURRENCY_PRECISION,
        }
    }

    /// Round order totals to `places` decimal places.
    #[must_use]
    pub fn with_currency_precision(mut self, places: u32) -> Self {
        self.currency_precision = places;
        self
    }

    /// Build order items priced at each product's current catalog price.
    async fn price_items(
        &self,
        order: OrderUuid,
        items: &[CartItemRecord],
    ) -> Result<Vec<OrderItemRecord>, OrdersServiceError> {
        let mut priced = Vec::with_capacity(items.len());

        for item in items {
            let product = self
                .products
                .get_product(item.product_uuid)
                .await
                .map_err(|source| match source {
                    StorageError::RowNotFound => OrdersServiceError::ProductNotFound {
                        product: item.product_uuid,
                    },
                    other => OrdersServiceError::Storage(other),
                })?;

            priced.push(OrderItemRecord {
                uuid: OrderItemUuid::new(),
                order_uuid: order,
                product_uuid: item.product_uuid,
                quantity: item.quantity,
                price: product.price,
            });
        }

        Ok(priced)
    }

    fn total_amount(&self, items: &[OrderItemRecord]) -> Decimal {
        items
            .iter()
            .map(OrderItemRecord::line_total)
            .sum::<Decimal>()
            .round_dp_with_strategy(
                self.currency_precision,
                RoundingStrategy::MidpointAwayFromZero,
            )
    }

    async fn release(&self, reservation: &Reservation) {
        if let Err(source) = self.ledger.release_many(reservation.lines()).await {
            error!("failed to release stock reservation: {source}");
        }
    }

    fn reject(&self, error: StockError) -> OrdersServiceError {
        warn!(product_uuid = %error.product(), "checkout rejected: {error}");

        if let StockError::Insufficient {
            product, requested, ..
        } = error
        {
            self.events.publish(ShopEvent::StockRejected {
                product_uuid: product,
                requested,
            });
        }

        error.into()
    }
}

#[async_trait]
impl OrdersService for DefaultOrdersService {
    #[instrument(skip(self, order), fields(user_uuid = %user))]
    async fn create_order(
        &self,
        user: UserUuid,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let _guard = self.locks.lock(user).await;

        if let Some(key) = order.idempotency_key
            && let Some(existing) = self.orders.find_by_idempotency_key(user, key).await?
        {
            debug!(order_uuid = %existing.uuid, "order already created for idempotency key");

            return Ok(existing);
        }

        let items = self.carts.list_items(user).await?;

        if items.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        let delivery_address = order.delivery_address.trim();

        if delivery_address.is_empty() {
            return Err(OrdersServiceError::InvalidAddress);
        }

        let lines: Vec<StockLine> = items
            .iter()
            .map(|item| StockLine::new(item.product_uuid, item.quantity))
            .collect();

        let reservation = self
            .ledger
            .reserve_many(&lines)
            .await
            .map_err(|source| self.reject(source))?;

        let order_uuid = OrderUuid::new();

        let order_items = match self.price_items(order_uuid, &items).await {
            Ok(priced) => priced,
            Err(source) => {
                self.release(&reservation).await;

                return Err(source);
            }
        };

        let now = Timestamp::now();

        let record = OrderRecord {
            uuid: order_uuid,
            user_uuid: user,
            status: OrderStatus::Processing,
            order_date: now,
            delivery_address: delivery_address.to_string(),
            total_amount: self.total_amount(&order_items),
            idempotency_key: order.idempotency_key,
            items: order_items,
            updated_at: now,
        };

        let created = match self.orders.create_order(record).await {
            Ok(created) => created,
            Err(source) => {
                error!("failed to persist order: {source}");

                self.release(&reservation).await;

                return Err(OrdersServiceError::Storage(source));
            }
        };

        if let Err(source) = self.carts.clear_items(user).await {
            error!(order_uuid = %created.uuid, "failed to clear cart after checkout: {source}");

            self.events.publish(ShopEvent::CartClearFailed {
                user_uuid: user,
                order_uuid: created.uuid,
            });
        }

        self.events.publish(ShopEvent::OrderCreated {
            user_uuid: user,
            order_uuid: created.uuid,
            items: created.items.len(),
        });

        info!(
            order_uuid = %created.uuid,
            total_amount = %created.total_amount,
            items = created.items.len(),
            "created order"
        );

        Ok(created)
    }

    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let record = self.orders.get_order(order).await?;

        if record.user_uuid != user {
            return Err(OrdersServiceError::NotOwner);
        }

        Ok(record)
    }

    async fn list_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        Ok(self.orders.list_orders(user).await?)
    }

    async fn get_order_items(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<Vec<OrderItemRecord>, OrdersServiceError> {
        Ok(self.get_order(user, order).await?.items)
    }

    async fn find_order_by_idempotency_key(
        &self,
        user: UserUuid,
        key: Uuid,
    ) -> Result<Option<OrderRecord>, OrdersServiceError> {
        Ok(self.orders.find_by_idempotency_key(user, key).await?)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Check out the user's cart.
    ///
    /// Reserves stock for every cart item at once, snapshots current prices,
    /// persists the order as [`OrderStatus::Processing`] and empties the cart.
    /// Nothing changes when an error is returned.
    async fn create_order(
        &self,
        user: UserUuid,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve one of the user's orders.
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// The user's orders, newest first.
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Line items of one of the user's orders.
    async fn get_order_items(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<Vec<OrderItemRecord>, OrdersServiceError>;

    /// The order a submission with `key` produced, if any.
    async fn find_order_by_idempotency_key(
        &self,
        user: UserUuid,
        key: Uuid,
    ) -> Result<Option<OrderRecord>, OrdersServiceError>;
}
