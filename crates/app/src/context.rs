//! App Context

use std::{path::PathBuf, sync::Arc};

use thiserror::Error;
use tracing::info;

use crate::{
    domain::{
        carts::{CartsService, DefaultCartsService, repository::InMemoryCartsRepository},
        events::{BroadcastEventBus, EventBus},
        orders::{
            DEFAULT_CURRENCY_PRECISION, DefaultOrderLifecycle, DefaultOrdersService,
            OrderLifecycle, OrdersService, repository::InMemoryOrdersRepository,
        },
        products::{
            DefaultProductsService, ProductsService, ProductsServiceError,
            repository::InMemoryProductsRepository,
        },
        stock::StockLedger,
    },
    fixtures::{self, FixtureError},
    locks::KeyedLocks,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to load catalog fixture")]
    Catalog(#[source] FixtureError),

    #[error("failed to seed catalog")]
    Seed(#[source] ProductsServiceError),
}

/// Commerce settings shared by the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommerceSettings {
    /// Decimal places order totals are rounded to.
    pub currency_precision: u32,

    /// Events buffered per subscriber before the slowest one starts lagging.
    pub event_buffer: usize,

    /// YAML catalog to seed at startup.
    pub catalog_file: Option<PathBuf>,
}

impl Default for CommerceSettings {
    fn default() -> Self {
        Self {
            currency_precision: DEFAULT_CURRENCY_PRECISION,
            event_buffer: 1024,
            catalog_file: None,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub lifecycle: Arc<dyn OrderLifecycle>,
    pub events: Arc<dyn EventBus>,
}

impl AppContext {
    /// Wire every service over in-memory repositories sharing one stock
    /// ledger and one set of per-user locks.
    #[must_use]
    pub fn in_memory(settings: &CommerceSettings) -> Self {
        let ledger = Arc::new(StockLedger::new());
        let events: Arc<dyn EventBus> = Arc::new(BroadcastEventBus::new(settings.event_buffer));
        let locks = Arc::new(KeyedLocks::new());

        let products_repository = Arc::new(InMemoryProductsRepository::new());
        let carts_repository = Arc::new(InMemoryCartsRepository::new());
        let orders_repository = Arc::new(InMemoryOrdersRepository::new());

        let products: Arc<dyn ProductsService> = Arc::new(DefaultProductsService::new(
            products_repository.clone(),
            Arc::clone(&ledger),
            Arc::clone(&events),
        ));

        let carts = DefaultCartsService::new(
            carts_repository.clone(),
            Arc::clone(&products),
            Arc::clone(&ledger),
            Arc::clone(&locks),
            Arc::clone(&events),
        );

        let orders = DefaultOrdersService::new(
            orders_repository.clone(),
            carts_repository,
            products_repository,
            Arc::clone(&ledger),
            locks,
            Arc::clone(&events),
        )
        .with_currency_precision(settings.currency_precision);

        let lifecycle = DefaultOrderLifecycle::new(orders_repository, ledger, Arc::clone(&events));

        Self {
            products,
            carts: Arc::new(carts),
            orders: Arc::new(orders),
            lifecycle: Arc::new(lifecycle),
            events,
        }
    }

    /// Build the context and seed the catalog from `settings.catalog_file`.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog file cannot be loaded or one of its
    /// products cannot be created.
    pub async fn from_settings(settings: &CommerceSettings) -> Result<Self, AppInitError> {
        let context = Self::in_memory(settings);

        if let Some(path) = &settings.catalog_file {
            let products = fixtures::load_catalog(path).map_err(AppInitError::Catalog)?;
            let count = products.len();

            for product in products {
                context
                    .products
                    .create_product(product)
                    .await
                    .map_err(AppInitError::Seed)?;
            }

            info!(products = count, path = %path.display(), "seeded catalog");
        }

        Ok(context)
    }
}
