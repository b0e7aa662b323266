//! Products service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::{info, instrument};

use crate::domain::{
    events::{EventBus, ShopEvent},
    products::{
        data::{NewProduct, ProductUpdate},
        errors::ProductsServiceError,
        records::{ProductRecord, ProductUuid},
        repository::{ProductRow, ProductsRepository},
    },
    stock::StockLedger,
};

#[derive(Clone)]
pub struct DefaultProductsService {
    repository: Arc<dyn ProductsRepository>,
    ledger: Arc<StockLedger>,
    events: Arc<dyn EventBus>,
}

impl DefaultProductsService {
    #[must_use]
    pub fn new(
        repository: Arc<dyn ProductsRepository>,
        ledger: Arc<StockLedger>,
        events: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            repository,
            ledger,
            events,
        }
    }

    async fn with_stock(&self, row: ProductRow) -> ProductRecord {
        let stock_quantity = self.ledger.level(row.uuid).await.unwrap_or(0);

        ProductRecord {
            uuid: row.uuid,
            name: row.name,
            price: row.price,
            stock_quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[async_trait]
impl ProductsService for DefaultProductsService {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let rows = self.repository.list_products().await?;

        let mut products = Vec::with_capacity(rows.len());

        for row in rows {
            products.push(self.with_stock(row).await);
        }

        Ok(products)
    }

    async fn get_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let row = self.repository.get_product(product).await?;

        Ok(self.with_stock(row).await)
    }

    #[instrument(skip(self), fields(product_uuid = %product.uuid))]
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        if product.price.is_sign_negative() {
            return Err(ProductsServiceError::InvalidPrice);
        }

        let name = product.name.trim();

        if name.is_empty() {
            return Err(ProductsServiceError::InvalidName);
        }

        // Stock is tracked before the row is visible to carts; every known
        // uuid, deleted or not, already has a level.
        if !self
            .ledger
            .track(product.uuid, product.stock_quantity)
            .await
        {
            return Err(ProductsServiceError::AlreadyExists);
        }

        let row = match self
            .repository
            .create_product(product.uuid, name.to_string(), product.price)
            .await
        {
            Ok(row) => row,
            Err(source) => {
                self.ledger.forget(product.uuid).await;

                return Err(source.into());
            }
        };

        info!(stock = product.stock_quantity, "created product");

        Ok(self.with_stock(row).await)
    }

    #[instrument(skip(self), fields(product_uuid = %product))]
    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductsServiceError> {
        if update.price.is_sign_negative() {
            return Err(ProductsServiceError::InvalidPrice);
        }

        let row = self.repository.update_price(product, update.price).await?;

        if let Some(quantity) = update.stock_quantity {
            self.ledger.register(product, quantity).await;
        }

        self.events.publish(ShopEvent::ProductUpdated {
            product_uuid: product,
        });

        Ok(self.with_stock(row).await)
    }

    #[instrument(skip(self), fields(product_uuid = %product))]
    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError> {
        let rows_affected = self.repository.delete_product(product).await?;

        if rows_affected == 0 {
            return Err(ProductsServiceError::NotFound);
        }

        self.events.publish(ShopEvent::ProductDeleted {
            product_uuid: product,
        });

        info!("deleted product");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieves all live products with their current stock levels.
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    /// Retrieve a single live product.
    async fn get_product(&self, product: ProductUuid)
    -> Result<ProductRecord, ProductsServiceError>;

    /// Creates a new product and starts tracking its stock.
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Changes a product's price and, optionally, replaces its stock level.
    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Soft deletes a product. Its stock counter is kept so cancelled orders
    /// can still return units to it.
    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError>;
}
