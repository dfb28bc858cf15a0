//! Query a running catalog service through the storefront client.
//!
//! Results are printed to stdout as pretty JSON.

use rust_decimal::Decimal;
use serde::Serialize;
use techmart_core::ProductId;
use techmart_storefront::models::ProductFilter;
use techmart_storefront::{ApiError, StorefrontApi, StorefrontConfig};

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Configuration error: {0}")]
    Config(#[from] techmart_storefront::config::ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Cannot render result: {0}")]
    Render(#[from] serde_json::Error),
}

/// Filters accepted by `techmart products list`.
#[derive(Debug, Default)]
pub struct ListArgs {
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl From<ListArgs> for ProductFilter {
    fn from(args: ListArgs) -> Self {
        Self {
            limit: args.limit,
            search: args.search,
            department: args.department,
            category: args.category,
            brand: args.brand,
            min_price: args.min_price,
            max_price: args.max_price,
        }
    }
}

fn api() -> Result<StorefrontApi, QueryError> {
    Ok(StorefrontApi::new(&StorefrontConfig::from_env()?)?)
}

fn print<T: Serialize>(value: &T) -> Result<(), QueryError> {
    let rendered = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{rendered}");
    }
    Ok(())
}

/// `techmart products list`
///
/// # Errors
///
/// Returns `QueryError` if the catalog cannot be reached.
pub async fn list(args: ListArgs) -> Result<(), QueryError> {
    let products = api()?.products.list(&args.into()).await?;
    tracing::info!(count = products.len(), "Fetched products");
    print(&products)
}

/// `techmart products get <id>`
///
/// # Errors
///
/// Returns `QueryError` if the product does not exist.
pub async fn get(id: ProductId) -> Result<(), QueryError> {
    print(&api()?.products.get(id).await?)
}

/// `techmart products sku <sku>`
///
/// # Errors
///
/// Returns `QueryError` if no product has the SKU.
pub async fn by_sku(sku: &str) -> Result<(), QueryError> {
    print(&api()?.products.by_sku(sku).await?)
}

/// `techmart products search <term>`
///
/// # Errors
///
/// Returns `QueryError` if the catalog cannot be reached.
pub async fn search(term: &str, limit: Option<u32>) -> Result<(), QueryError> {
    let products = api()?.products.search(term, limit).await?;
    tracing::info!(count = products.len(), "Search complete");
    print(&products)
}
