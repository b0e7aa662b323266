//! Orders Repository

use std::cmp::Reverse;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    domain::{
        orders::records::{OrderRecord, OrderStatus, OrderUuid},
        users::UserUuid,
    },
    storage::StorageError,
};

#[automock]
#[async_trait]
pub trait OrdersRepository: Send + Sync {
    /// Persist an order together with its items.
    ///
    /// A second order for the same (user, idempotency key) pair is a
    /// [`StorageError::UniqueViolation`].
    async fn create_order(&self, order: OrderRecord) -> Result<OrderRecord, StorageError>;

    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, StorageError>;

    /// A user's orders, newest first.
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, StorageError>;

    async fn find_by_idempotency_key(
        &self,
        user: UserUuid,
        key: Uuid,
    ) -> Result<Option<OrderRecord>, StorageError>;

    /// Move `order` from `expected` to `next`.
    ///
    /// Fails with [`StorageError::Conflict`] when the stored status is no
    /// longer `expected`.
    async fn compare_and_set_status(
        &self,
        order: OrderUuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<OrderRecord, StorageError>;
}

#[derive(Debug, Default)]
pub struct InMemoryOrdersRepository {
    orders: RwLock<FxHashMap<OrderUuid, OrderRecord>>,
}

impl InMemoryOrdersRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrdersRepository for InMemoryOrdersRepository {
    async fn create_order(&self, order: OrderRecord) -> Result<OrderRecord, StorageError> {
        let mut orders = self.orders.write().await;

        if orders.contains_key(&order.uuid) {
            return Err(StorageError::UniqueViolation);
        }

        if let Some(key) = order.idempotency_key {
            let duplicate = orders.values().any(|existing| {
                existing.user_uuid == order.user_uuid && existing.idempotency_key == Some(key)
            });

            if duplicate {
                return Err(StorageError::UniqueViolation);
            }
        }

        orders.insert(order.uuid, order.clone());

        Ok(order)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, StorageError> {
        self.orders
            .read()
            .await
            .get(&order)
            .cloned()
            .ok_or(StorageError::RowNotFound)
    }

    async fn list_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, StorageError> {
        let mut orders: Vec<OrderRecord> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.user_uuid == user)
            .cloned()
            .collect();

        orders.sort_by_key(|order| Reverse((order.order_date, order.uuid)));

        Ok(orders)
    }

    async fn find_by_idempotency_key(
        &self,
        user: UserUuid,
        key: Uuid,
    ) -> Result<Option<OrderRecord>, StorageError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|order| order.user_uuid == user && order.idempotency_key == Some(key))
            .cloned())
    }

    async fn compare_and_set_status(
        &self,
        order: OrderUuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<OrderRecord, StorageError> {
        let mut orders = self.orders.write().await;

        let row = orders.get_mut(&order).ok_or(StorageError::RowNotFound)?;

        if row.status != expected {
            return Err(StorageError::Conflict);
        }

        row.status = next;
        row.updated_at = Timestamp::now();

        Ok(row.clone())
    }
}
