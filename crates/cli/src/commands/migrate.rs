//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! techmart migrate catalog
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string for the catalog
//!   (falls back to `DATABASE_URL`)
//!
//! Migration files live in `crates/catalog/migrations/`.

use techmart_catalog::{config, db};

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run catalog database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn catalog() -> Result<(), MigrationError> {
    let database_url = config::database_url_from_env();

    tracing::info!("Connecting to catalog database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running catalog migrations...");
    sqlx::migrate!("../catalog/migrations").run(&pool).await?;
    pool.close().await;

    tracing::info!("Catalog migrations complete!");
    Ok(())
}
