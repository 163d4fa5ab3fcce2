//! App Context

use std::{
    fmt::{self, Debug},
    sync::Arc,
};

use sqlx::migrate::MigrateError;
use thiserror::Error;
use tracing::info;

use crate::{
    config::{AppConfig, StoreBackend},
    database,
    domain::{
        carts::{CartsService, StoreCartsService},
        orders::{OrdersService, StoreOrdersService},
        products::{ProductsService, StoreProductsService},
    },
    notify::{BroadcastNotifier, NoopNotifier, Notifier},
    store::{Collections, StoreError},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrate(#[source] MigrateError),

    #[error("failed to open data directory")]
    Store(#[source] StoreError),

    #[error("a database URL is required for the postgres store")]
    MissingDatabaseUrl,
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub live_updates: Option<BroadcastNotifier>,
}

impl AppContext {
    /// Build application context over the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error when the data directory cannot be opened, or the
    /// database cannot be reached or migrated.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let collections = match config.store.backend {
            StoreBackend::Memory => Collections::memory(),
            StoreBackend::File => Collections::file(&config.store.data_dir)
                .await
                .map_err(AppInitError::Store)?,
            StoreBackend::Postgres => {
                let url = config
                    .store
                    .database_url
                    .as_deref()
                    .ok_or(AppInitError::MissingDatabaseUrl)?;

                let pool = database::connect(url)
                    .await
                    .map_err(AppInitError::Database)?;

                database::migrate(&pool)
                    .await
                    .map_err(AppInitError::Migrate)?;

                Collections::postgres(&pool)
            }
        };

        info!(backend = ?config.store.backend, live_updates = config.live_updates, "store ready");

        let live_updates = config.live_updates.then(BroadcastNotifier::default);

        let notifier: Arc<dyn Notifier> = match &live_updates {
            Some(broadcast) => Arc::new(broadcast.clone()),
            None => Arc::new(NoopNotifier),
        };

        Ok(Self {
            live_updates,
            ..Self::new(collections, notifier)
        })
    }

    /// Context over a fresh in-memory store with notifications discarded.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Collections::memory(), Arc::new(NoopNotifier))
    }

    /// Wire the services over `collections`.
    #[must_use]
    pub fn new(collections: Collections, notifier: Arc<dyn Notifier>) -> Self {
        let products = Arc::new(StoreProductsService::new(
            collections.products,
            Arc::clone(&notifier),
        ));

        let carts = Arc::new(StoreCartsService::new(collections.carts, products.clone()));

        let orders = Arc::new(StoreOrdersService::new(
            collections.orders,
            carts.clone(),
            products.clone(),
            notifier,
        ));

        Self {
            products,
            carts,
            orders,
            live_updates: None,
        }
    }
}

impl Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("live_updates", &self.live_updates.is_some())
            .finish_non_exhaustive()
    }
}
