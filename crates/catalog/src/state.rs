//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::db::{PgDealStore, PgProductStore};
use crate::services::{CatalogService, DealService};
use crate::store::{DealStore, ProductStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The pool is created once at startup and
/// handed in here; there is no global connection handle.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: CatalogService,
    deals: DealService,
    pool: Option<PgPool>,
}

impl AppState {
    /// State backed by `PostgreSQL`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let products: Arc<dyn ProductStore> = Arc::new(PgProductStore::new(pool.clone()));
        let deals: Arc<dyn DealStore> = Arc::new(PgDealStore::new(pool.clone()));
        Self {
            inner: Arc::new(AppStateInner {
                catalog: CatalogService::new(products),
                deals: DealService::new(deals),
                pool: Some(pool),
            }),
        }
    }

    /// State backed by arbitrary stores, without a database pool.
    #[must_use]
    pub fn with_stores(products: Arc<dyn ProductStore>, deals: Arc<dyn DealStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog: CatalogService::new(products),
                deals: DealService::new(deals),
                pool: None,
            }),
        }
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the deal service.
    #[must_use]
    pub fn deals(&self) -> &DealService {
        &self.inner.deals
    }

    /// Get a reference to the database connection pool, if any.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
