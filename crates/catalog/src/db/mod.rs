//! `PostgreSQL` access for the catalog.
//!
//! `catalog.product` holds flattened product records and `catalog.deal` the
//! promotions that point at them. Schema changes live in `crates/catalog/migrations/` and are applied with
//! `techmart migrate catalog`.

pub mod deals;
pub mod products;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use deals::PgDealStore;
pub use products::PgProductStore;

const MAX_CONNECTIONS: u32 = 10;
const MIN_CONNECTIONS: u32 = 2;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row no longer satisfies the product invariants.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("not found")]
    NotFound,

    /// Duplicate id or SKU.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Connect the pool shared by every handler. Called once at startup.
///
/// # Errors
///
/// Returns `sqlx::Error` if no connection can be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(MIN_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url.expose_secret())
        .await
}

/// Round-trip a trivial query.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the database cannot be reached.
pub async fn ping(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
