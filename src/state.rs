//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::services::auth::TokenService;
use crate::services::ingestion::OrderIngestion;
use crate::services::notifications::OrderNotifier;
use crate::services::payments::PaymentGateway;
use crate::store::memory::{MemoryAdminStore, MemoryCollectionStore, MemoryOrderStore, MemoryProductStore};
use crate::store::postgres::{PgAdminStore, PgCollectionStore, PgOrderStore, PgProductStore};
use crate::store::{AdminStore, CollectionStore, OrderStore, ProductStore};

#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pub collections: Arc<dyn CollectionStore>,
    pub admins: Arc<dyn AdminStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            products: Arc::new(PgProductStore::new(pool.clone())),
            orders: Arc::new(PgOrderStore::new(pool.clone())),
            collections: Arc::new(PgCollectionStore::new(pool.clone())),
            admins: Arc::new(PgAdminStore::new(pool)),
        }
    }

    pub fn memory() -> Self {
        Self {
            products: Arc::new(MemoryProductStore::new()),
            orders: Arc::new(MemoryOrderStore::new()),
            collections: Arc::new(MemoryCollectionStore::new()),
            admins: Arc::new(MemoryAdminStore::new()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub stores: Stores,
    pub payments: Arc<dyn PaymentGateway>,
    pub tokens: TokenService,
    pub ingestion: OrderIngestion,
}

impl AppState {
    pub fn new(config: AppConfig, stores: Stores, payments: Arc<dyn PaymentGateway>, notifier: Option<Arc<dyn OrderNotifier>>) -> Self {
        let tokens = TokenService::new(&config.auth);
        let ingestion = OrderIngestion::new(stores.orders.clone(), stores.products.clone(), notifier);
        Self { config: Arc::new(config), stores, payments, tokens, ingestion }
    }
}
