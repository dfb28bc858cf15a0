//! Catalog service client.
//!
//! Unwraps the catalog's `{success, data, count}` envelope. Single-product
//! lookups by id or SKU are cached for 5 minutes.

use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use techmart_core::ProductId;
use tracing::instrument;

use super::{ServiceClient, with_query};
use crate::error::ApiError;
use crate::models::{Product, ProductFilter};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Id(ProductId),
    Sku(String),
}

/// The catalog's response envelope.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> Envelope<T> {
    pub(super) fn into_data(self) -> Result<T, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => {
                let reason = self
                    .error
                    .or(self.message)
                    .unwrap_or_else(|| "response carried no data".to_owned());
                tracing::error!(%reason, "Catalog rejected request");
                Err(ApiError::Rejected(reason))
            }
        }
    }
}

/// Client for the product catalog.
#[derive(Clone)]
pub struct ProductsClient {
    api: ServiceClient,
    cache: Cache<CacheKey, Product>,
}

impl ProductsClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();
        Self {
            api: ServiceClient::new(http, base_url, "catalog"),
            cache,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.api.json(self.api.get(path)).await?;
        envelope.into_data()
    }

    /// `GET /products` with optional filters.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the envelope carries no data.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        self.fetch(&with_query("", &filter.query_pairs())).await
    }

    /// `GET /products/{id}`, cached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 404 for unknown or deleted products.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<Product, ApiError> {
        if let Some(product) = self.cache.get(&CacheKey::Id(id)).await {
            tracing::debug!("Cache hit");
            return Ok(product);
        }
        let product: Product = self.fetch(&id.to_string()).await?;
        self.remember(&product).await;
        Ok(product)
    }

    /// `GET /products/sku/{sku}`, cached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 404 when no active product has the SKU.
    #[instrument(skip(self))]
    pub async fn by_sku(&self, sku: &str) -> Result<Product, ApiError> {
        let key = CacheKey::Sku(sku.to_owned());
        if let Some(product) = self.cache.get(&key).await {
            tracing::debug!("Cache hit");
            return Ok(product);
        }
        let product: Product = self
            .fetch(&format!("sku/{}", urlencoding::encode(sku)))
            .await?;
        self.remember(&product).await;
        Ok(product)
    }

    /// `GET /products/search/{term}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str, limit: Option<u32>) -> Result<Vec<Product>, ApiError> {
        let path = format!("search/{}", urlencoding::encode(term));
        self.fetch(&with_query(&path, &limit_pair(limit))).await
    }

    /// `GET /products/department/{department}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn by_department(
        &self,
        department: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Product>, ApiError> {
        let path = format!("department/{}", urlencoding::encode(department));
        self.fetch(&with_query(&path, &limit_pair(limit))).await
    }

    /// Drop every cached product, e.g. after an admin edit.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    async fn remember(&self, product: &Product) {
        self.cache
            .insert(CacheKey::Id(product.id), product.clone())
            .await;
        self.cache
            .insert(CacheKey::Sku(product.sku.to_string()), product.clone())
            .await;
    }
}

pub(super) fn limit_pair(limit: Option<u32>) -> Vec<(&'static str, String)> {
    limit
        .map(|limit| vec![("limit", limit.to_string())])
        .unwrap_or_default()
}
