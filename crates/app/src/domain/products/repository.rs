//! Products Repository

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::{domain::products::records::ProductUuid, storage::StorageError};

/// Catalog row as stored; stock levels live in the stock ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub uuid: ProductUuid,
    pub name: String,
    pub price: Decimal,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

#[automock]
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    /// Live products in creation order.
    async fn list_products(&self) -> Result<Vec<ProductRow>, StorageError>;

    /// A live product; soft-deleted rows are [`StorageError::RowNotFound`].
    async fn get_product(&self, product: ProductUuid) -> Result<ProductRow, StorageError>;

    async fn create_product(
        &self,
        product: ProductUuid,
        name: String,
        price: Decimal,
    ) -> Result<ProductRow, StorageError>;

    async fn update_price(
        &self,
        product: ProductUuid,
        price: Decimal,
    ) -> Result<ProductRow, StorageError>;

    /// Soft delete, returning the number of rows affected.
    async fn delete_product(&self, product: ProductUuid) -> Result<u64, StorageError>;
}

#[derive(Debug, Default)]
pub struct InMemoryProductsRepository {
    rows: RwLock<FxHashMap<ProductUuid, ProductRow>>,
}

impl InMemoryProductsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductsRepository for InMemoryProductsRepository {
    async fn list_products(&self) -> Result<Vec<ProductRow>, StorageError> {
        let mut products: Vec<ProductRow> = self
            .rows
            .read()
            .await
            .values()
            .filter(|row| row.deleted_at.is_none())
            .cloned()
            .collect();

        products.sort_by_key(|row| row.uuid);

        Ok(products)
    }

    async fn get_product(&self, product: ProductUuid) -> Result<ProductRow, StorageError> {
        self.rows
            .read()
            .await
            .get(&product)
            .filter(|row| row.deleted_at.is_none())
            .cloned()
            .ok_or(StorageError::RowNotFound)
    }

    async fn create_product(
        &self,
        product: ProductUuid,
        name: String,
        price: Decimal,
    ) -> Result<ProductRow, StorageError> {
        let mut rows = self.rows.write().await;

        if rows.contains_key(&product) {
            return Err(StorageError::UniqueViolation);
        }

        let now = Timestamp::now();

        let row = ProductRow {
            uuid: product,
            name,
            price,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        rows.insert(product, row.clone());

        Ok(row)
    }

    async fn update_price(
        &self,
        product: ProductUuid,
        price: Decimal,
    ) -> Result<ProductRow, StorageError> {
        let mut rows = self.rows.write().await;

        let row = rows
            .get_mut(&product)
            .filter(|row| row.deleted_at.is_none())
            .ok_or(StorageError::RowNotFound)?;

        row.price = price;
        row.updated_at = Timestamp::now();

        Ok(row.clone())
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<u64, StorageError> {
        let mut rows = self.rows.write().await;

        match rows.get_mut(&product) {
            Some(row) if row.deleted_at.is_none() => {
                let now = Timestamp::now();

                row.deleted_at = Some(now);
                row.updated_at = now;

                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
