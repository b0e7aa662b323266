//! Cart Items Repository

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::{
    domain::{
        carts::records::{CartItemRecord, CartItemUuid},
        products::records::ProductUuid,
        users::UserUuid,
    },
    storage::StorageError,
};

#[automock]
#[async_trait]
pub trait CartsRepository: Send + Sync {
    /// A user's items in insertion order.
    async fn list_items(&self, user: UserUuid) -> Result<Vec<CartItemRecord>, StorageError>;

    /// The item of `user` with the given uuid; other users' items are
    /// [`StorageError::RowNotFound`].
    async fn get_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
    ) -> Result<CartItemRecord, StorageError>;

    async fn find_item_by_product(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<Option<CartItemRecord>, StorageError>;

    async fn create_item(
        &self,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, StorageError>;

    async fn set_quantity(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, StorageError>;

    /// Returns the number of rows affected.
    async fn delete_item(&self, user: UserUuid, item: CartItemUuid) -> Result<u64, StorageError>;

    /// Returns the number of rows affected.
    async fn clear_items(&self, user: UserUuid) -> Result<u64, StorageError>;
}

#[derive(Debug, Default)]
pub struct InMemoryCartsRepository {
    carts: RwLock<FxHashMap<UserUuid, Vec<CartItemRecord>>>,
}

impl InMemoryCartsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartsRepository for InMemoryCartsRepository {
    async fn list_items(&self, user: UserUuid) -> Result<Vec<CartItemRecord>, StorageError> {
        Ok(self
            .carts
            .read()
            .await
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
    ) -> Result<CartItemRecord, StorageError> {
        self.carts
            .read()
            .await
            .get(&user)
            .and_then(|items| items.iter().find(|row| row.uuid == item))
            .cloned()
            .ok_or(StorageError::RowNotFound)
    }

    async fn find_item_by_product(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<Option<CartItemRecord>, StorageError> {
        Ok(self
            .carts
            .read()
            .await
            .get(&user)
            .and_then(|items| items.iter().find(|row| row.product_uuid == product))
            .cloned())
    }

    async fn create_item(
        &self,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, StorageError> {
        let mut carts = self.carts.write().await;
        let items = carts.entry(user).or_default();

        if items.iter().any(|row| row.product_uuid == product) {
            return Err(StorageError::UniqueViolation);
        }

        let now = Timestamp::now();

        let row = CartItemRecord {
            uuid: CartItemUuid::new(),
            user_uuid: user,
            product_uuid: product,
            quantity,
            created_at: now,
            updated_at: now,
        };

        items.push(row.clone());

        Ok(row)
    }

    async fn set_quantity(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, StorageError> {
        let mut carts = self.carts.write().await;

        let row = carts
            .get_mut(&user)
            .and_then(|items| items.iter_mut().find(|row| row.uuid == item))
            .ok_or(StorageError::RowNotFound)?;

        row.quantity = quantity;
        row.updated_at = Timestamp::now();

        Ok(row.clone())
    }

    async fn delete_item(&self, user: UserUuid, item: CartItemUuid) -> Result<u64, StorageError> {
        let mut carts = self.carts.write().await;

        let Some(items) = carts.get_mut(&user) else {
            return Ok(0);
        };

        let before = items.len();

        items.retain(|row| row.uuid != item);

        Ok(u64::from(before != items.len()))
    }

    async fn clear_items(&self, user: UserUuid) -> Result<u64, StorageError> {
        let removed = self.carts.write().await.remove(&user).unwrap_or_default();

        Ok(removed.len() as u64)
    }
}
