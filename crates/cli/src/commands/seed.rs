//! Seed the catalog from product or deal data files.
//!
//! Reads a JSON or YAML array of records (products may be flattened or
//! legacy variant-nested), validates every record, and replaces the stored
//! collection with them. `--dry-run` validates against an in-memory store
//! without touching the database.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use techmart_catalog::config;
use techmart_catalog::db::{self, PgDealStore, PgProductStore};
use techmart_catalog::models::{NewDeal, SeedProduct};
use techmart_catalog::services::{CatalogError, CatalogService, DealService};
use techmart_catalog::store::{MemoryDealStore, MemoryProductStore};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON seed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Seed file contains no records")]
    Empty,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Parse seed records; `.yaml`/`.yml` files as YAML, everything else as JSON.
///
/// # Errors
///
/// Returns `SeedError` for malformed content or an empty list.
pub fn parse_records<T: DeserializeOwned>(path: &Path, content: &str) -> Result<Vec<T>, SeedError> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    let records: Vec<T> = if is_yaml {
        serde_yaml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };
    if records.is_empty() {
        return Err(SeedError::Empty);
    }
    Ok(records)
}

async fn read_records<T: DeserializeOwned>(file_path: &str) -> Result<Vec<T>, SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading records from file");
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let records = parse_records(path, &content)?;
    info!(records = records.len(), "Parsed seed file");
    Ok(records)
}

/// Replace the catalog with the products in `file_path`.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read or parsed, a record is
/// invalid, or the database write fails.
pub async fn products(file_path: &str, dry_run: bool) -> Result<(), SeedError> {
    let records: Vec<SeedProduct> = read_records(file_path).await?;

    if dry_run {
        let catalog = CatalogService::new(Arc::new(MemoryProductStore::new()));
        let loaded = catalog.bulk_load(records).await?;
        info!(loaded, "Dry run: every record is valid, database untouched");
        return Ok(());
    }

    let pool = db::create_pool(&config::database_url_from_env()).await?;
    info!("Connected to database");
    let catalog = CatalogService::new(Arc::new(PgProductStore::new(pool.clone())));
    let loaded = catalog.bulk_load(records).await;
    pool.close().await;

    info!(loaded = loaded?, "Seeding complete!");
    Ok(())
}

/// Replace every deal with the deals in `file_path`.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read or parsed, a record is
/// invalid, or the database write fails.
pub async fn deals(file_path: &str, dry_run: bool) -> Result<(), SeedError> {
    let records: Vec<NewDeal> = read_records(file_path).await?;

    if dry_run {
        let deals = DealService::new(Arc::new(MemoryDealStore::new()));
        let loaded = deals.bulk_load(records).await?;
        info!(loaded, "Dry run: every deal is valid, database untouched");
        return Ok(());
    }

    let pool = db::create_pool(&config::database_url_from_env()).await?;
    let deals = DealService::new(Arc::new(PgDealStore::new(pool.clone())));
    let loaded = deals.bulk_load(records).await;
    pool.close().await;

    info!(loaded = loaded?, "Deal seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_and_yaml() {
        let json = r#"[{"_id": 1, "title": "USB-C Hub", "price": 29.99,
                        "variants": [{"sku": "HUB-1"}]}]"#;
        let records: Vec<SeedProduct> = parse_records(Path::new("products.json"), json).unwrap();
        assert_eq!(records[0].resolved_sku(), "HUB-1");

        let yaml = "- id: 2\n  title: Webcam\n  price: 49.5\n  sku: CAM-1\n  brand: Looky\n";
        let records: Vec<SeedProduct> = parse_records(Path::new("products.YML"), yaml).unwrap();
        assert_eq!(records[0].resolved_brand(), "Looky");
    }

    #[test]
    fn test_empty_file_is_rejected() {
        assert!(matches!(
            parse_records::<SeedProduct>(Path::new("products.json"), "[]"),
            Err(SeedError::Empty)
        ));
        assert!(matches!(
            parse_records::<SeedProduct>(Path::new("products.json"), "{"),
            Err(SeedError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_dry_run_validates_without_database() {
        let dir = std::env::temp_dir().join(format!("techmart-seed-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("products.json");
        std::fs::write(
            &file,
            r#"[{"id": 1, "sku": "A-1", "title": "Cable", "price": 5},
                {"id": 2, "sku": "A-1", "title": "Adapter", "price": 7}]"#,
        )
        .unwrap();

        let err = products(file.to_str().unwrap(), true).await.unwrap_err();
        assert!(matches!(err, SeedError::Catalog(CatalogError::Conflict(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_deal_dry_run_rejects_invalid_discount() {
        let dir = std::env::temp_dir().join(format!("techmart-deals-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("deals.yaml");
        std::fs::write(
            &file,
            "- productId: 1\n  variantSku: A-1\n  department: Home\n  title: Lamp\n  price: 5\n  discount: 140\n",
        )
        .unwrap();

        let err = deals(file.to_str().unwrap(), true).await.unwrap_err();
        assert!(matches!(err, SeedError::Catalog(CatalogError::Validation(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
