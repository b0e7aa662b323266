//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::{debug, instrument, warn};

use crate::{
    domain::{
        carts::{
            data::NewCartItem,
            errors::CartsServiceError,
            records::{CartItemRecord, CartItemUuid, CartLine},
            repository::CartsRepository,
        },
        events::{EventBus, ShopEvent},
        products::{ProductsService, ProductsServiceError, records::ProductUuid},
        stock::StockLedger,
        users::UserUuid,
    },
    locks::KeyedLocks,
};

#[derive(Clone)]
pub struct DefaultCartsService {
    repository: Arc<dyn CartsRepository>,
    products: Arc<dyn ProductsService>,
    ledger: Arc<StockLedger>,
    locks: Arc<KeyedLocks<UserUuid>>,
    events: Arc<dyn EventBus>,
}

impl DefaultCartsService {
    /// `locks` must be the same per-user locks the orders service uses, so
    /// cart edits never interleave with a checkout of the same cart.
    #[must_use]
    pub fn new(
        repository: Arc<dyn CartsRepository>,
        products: Arc<dyn ProductsService>,
        ledger: Arc<StockLedger>,
        locks: Arc<KeyedLocks<UserUuid>>,
        events: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            repository,
            products,
            ledger,
            locks,
            events,
        }
    }

    async fn ensure_available(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), CartsServiceError> {
        if self.ledger.check_available(product, quantity).await {
            return Ok(());
        }

        warn!(product_uuid = %product, requested = quantity, "cart quantity exceeds stock");

        self.events.publish(ShopEvent::StockRejected {
            product_uuid: product,
            requested: quantity,
        });

        let name = self
            .products
            .get_product(product)
            .await
            .ok()
            .map(|record| record.name);

        Err(CartsServiceError::InsufficientStock { product, name })
    }
}

#[async_trait]
impl CartsService for DefaultCartsService {
    #[instrument(skip(self), fields(user_uuid = %user, product_uuid = %item.product_uuid))]
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
    ) -> Result<CartItemRecord, CartsServiceError> {
        if item.quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let _guard = self.locks.lock(user).await;

        let catalog = self
            .products
            .get_product(item.product_uuid)
            .await
            .map_err(|source| CartsServiceError::from_catalog(item.product_uuid, source))?;

        let existing = self
            .repository
            .find_item_by_product(user, item.product_uuid)
            .await?;

        if let Some(existing) = existing {
            let combined = existing.quantity.checked_add(item.quantity).ok_or_else(|| {
                CartsServiceError::InsufficientStock {
                    product: item.product_uuid,
                    name: Some(catalog.name.clone()),
                }
            })?;

            self.ensure_available(item.product_uuid, combined).await?;

            let updated = self
                .repository
                .set_quantity(user, existing.uuid, combined)
                .await?;

            debug!(quantity = combined, "incremented cart item");

            self.events.publish(ShopEvent::CartItemUpdated {
                user_uuid: user,
                item_uuid: updated.uuid,
                quantity: updated.quantity,
            });

            return Ok(updated);
        }

        self.ensure_available(item.product_uuid, item.quantity).await?;

        let created = self
            .repository
            .create_item(user, item.product_uuid, item.quantity)
            .await?;

        debug!(quantity = item.quantity, "added cart item");

        self.events.publish(ShopEvent::CartItemAdded {
            user_uuid: user,
            item_uuid: created.uuid,
            product_uuid: created.product_uuid,
            quantity: created.quantity,
        });

        Ok(created)
    }

    #[instrument(skip(self), fields(user_uuid = %user, item_uuid = %item))]
    async fn update_quantity(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let _guard = self.locks.lock(user).await;

        let current = self.repository.get_item(user, item).await?;

        self.ensure_available(current.product_uuid, quantity).await?;

        let updated = self.repository.set_quantity(user, item, quantity).await?;

        self.events.publish(ShopEvent::CartItemUpdated {
            user_uuid: user,
            item_uuid: item,
            quantity,
        });

        Ok(updated)
    }

    #[instrument(skip(self), fields(user_uuid = %user, item_uuid = %item))]
    async fn remove_item(&self, user: UserUuid, item: CartItemUuid) -> Result<(), CartsServiceError> {
        let _guard = self.locks.lock(user).await;

        let rows_affected = self.repository.delete_item(user, item).await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        self.events.publish(ShopEvent::CartItemRemoved {
            user_uuid: user,
            item_uuid: item,
        });

        Ok(())
    }

    async fn list_items(&self, user: UserUuid) -> Result<Vec<CartLine>, CartsServiceError> {
        let items = self.repository.list_items(user).await?;

        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            let product = match self.products.get_product(item.product_uuid).await {
                Ok(product) => Some(product),
                Err(ProductsServiceError::NotFound) => None,
                Err(source) => {
                    return Err(CartsServiceError::from_catalog(item.product_uuid, source));
                }
            };

            lines.push(CartLine { item, product });
        }

        Ok(lines)
    }

    async fn clear_items(&self, user: UserUuid) -> Result<(), CartsServiceError> {
        let _guard = self.locks.lock(user).await;

        self.repository.clear_items(user).await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Add a product to the user's cart, or increase the quantity of the
    /// existing item for that product.
    ///
    /// Stock is checked against the combined quantity but not reserved.
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
    ) -> Result<CartItemRecord, CartsServiceError>;

    /// Replace the quantity of one of the user's items.
    async fn update_quantity(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, CartsServiceError>;

    /// Remove one of the user's items.
    async fn remove_item(&self, user: UserUuid, item: CartItemUuid) -> Result<(), CartsServiceError>;

    /// The user's items in the order they were added.
    async fn list_items(&self, user: UserUuid) -> Result<Vec<CartLine>, CartsServiceError>;

    /// Empty the user's cart. Emptying an empty cart succeeds.
    async fn clear_items(&self, user: UserUuid) -> Result<(), CartsServiceError>;
}
