//! Product storage abstraction.
//!
//! The catalog service talks to a [`ProductStore`] and the deal service to a
//! [`DealStore`]; the `Pg*` stores back production and the in-memory ones
//! back tests and local demos.

mod memory;
mod memory_deals;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use techmart_core::{DealId, ProductId, Sku};

use crate::db::RepositoryError;
use crate::models::{Deal, DealStats, Product, ProductStats};
use crate::search::TextQuery;

pub use memory::MemoryProductStore;
pub use memory_deals::MemoryDealStore;

/// Result ordering for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductOrder {
    /// Most recently created first.
    #[default]
    Newest,
    /// Highest rating first.
    RatingDesc,
    /// Cheapest first.
    PriceAsc,
    /// Lowest stock first.
    StockAsc,
}

/// Selection over active products.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub text: Option<TextQuery>,
    /// Inclusive `(min, max)` price bounds.
    pub price_range: Option<(Decimal, Decimal)>,
    /// Only products with `stock <= max_stock`.
    pub max_stock: Option<i32>,
    pub order: ProductOrder,
    pub limit: Option<i64>,
}

impl ProductQuery {
    #[must_use]
    pub fn text(mut self, query: TextQuery) -> Self {
        self.text = Some(query);
        self
    }

    #[must_use]
    pub const fn price_range(mut self, min: Decimal, max: Decimal) -> Self {
        self.price_range = Some((min, max));
        self
    }

    #[must_use]
    pub const fn max_stock(mut self, threshold: i32) -> Self {
        self.max_stock = Some(threshold);
        self
    }

    #[must_use]
    pub const fn order(mut self, order: ProductOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Persistent product storage.
///
/// Lookups by id see inactive products only when asked to; every listing is
/// restricted to active products.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Active products matching `query`.
    async fn find(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError>;

    /// A product by id.
    async fn get(
        &self,
        id: ProductId,
        include_inactive: bool,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Whether any product, active or not, other than `except` uses `sku`.
    async fn sku_exists(
        &self,
        sku: &Sku,
        except: Option<ProductId>,
    ) -> Result<bool, RepositoryError>;

    /// Highest id in use, active or not.
    async fn max_id(&self) -> Result<Option<ProductId>, RepositoryError>;

    /// Insert a new product.
    ///
    /// Returns `RepositoryError::Conflict` if the id or SKU is taken.
    async fn insert(&self, product: &Product) -> Result<Product, RepositoryError>;

    /// Overwrite the active product with the same id. Returns `None` if there
    /// is no such active product.
    async fn update(&self, product: &Product) -> Result<Option<Product>, RepositoryError>;

    /// Set the active flag on a product regardless of its current state.
    async fn set_active(
        &self,
        id: ProductId,
        active: bool,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Set stock on an active product.
    async fn set_stock(
        &self,
        id: ProductId,
        stock: i32,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Physically remove a product, returning what was removed.
    async fn remove(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Replace the entire collection.
    async fn replace_all(&self, products: Vec<Product>) -> Result<u64, RepositoryError>;

    /// Aggregate statistics over active products.
    async fn stats(&self) -> Result<ProductStats, RepositoryError>;
}

/// Result ordering for deal listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DealOrder {
    /// Most recently updated first.
    #[default]
    Recent,
    /// Highest rating first, then most recently updated.
    RatingDesc,
    /// Cheapest first.
    PriceAsc,
}

/// Selection over active deals.
#[derive(Debug, Clone, Default)]
pub struct DealQuery {
    /// Case-insensitive substring over title, description, short
    /// description and department.
    pub text: Option<String>,
    /// Case-insensitive substring over department only.
    pub department: Option<String>,
    pub product_id: Option<ProductId>,
    /// Inclusive `(min, max)` price bounds.
    pub price_range: Option<(Decimal, Decimal)>,
    pub min_rating: Option<Decimal>,
    pub updated_since: Option<DateTime<Utc>>,
    pub order: DealOrder,
    pub limit: Option<i64>,
}

impl DealQuery {
    #[must_use]
    pub fn text(mut self, term: &str) -> Self {
        self.text = Some(term.to_owned());
        self
    }

    #[must_use]
    pub fn department(mut self, department: &str) -> Self {
        self.department = Some(department.to_owned());
        self
    }

    #[must_use]
    pub const fn product(mut self, id: ProductId) -> Self {
        self.product_id = Some(id);
        self
    }

    #[must_use]
    pub const fn price_range(mut self, min: Decimal, max: Decimal) -> Self {
        self.price_range = Some((min, max));
        self
    }

    #[must_use]
    pub const fn min_rating(mut self, rating: Decimal) -> Self {
        self.min_rating = Some(rating);
        self
    }

    #[must_use]
    pub const fn updated_since(mut self, since: DateTime<Utc>) -> Self {
        self.updated_since = Some(since);
        self
    }

    #[must_use]
    pub const fn order(mut self, order: DealOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether an active deal satisfies every filter.
    #[must_use]
    pub fn matches(&self, deal: &Deal) -> bool {
        let contains = |haystack: Option<&str>, needle: &str| {
            haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        };
        self.text.as_deref().is_none_or(|term| {
            [
                Some(deal.title.as_str()),
                deal.description.as_deref(),
                deal.short_description.as_deref(),
                Some(deal.department.as_str()),
            ]
            .into_iter()
            .any(|field| contains(field, term))
        }) && self
            .department
            .as_deref()
            .is_none_or(|d| contains(Some(deal.department.as_str()), d))
            && self.product_id.is_none_or(|id| deal.product_id == id)
            && self
                .price_range
                .is_none_or(|(min, max)| deal.price >= min && deal.price <= max)
            && self.min_rating.is_none_or(|r| deal.rating >= r)
            && self.updated_since.is_none_or(|t| deal.last_updated >= t)
    }
}

/// Persistent deal storage. Listings only ever see active deals.
#[async_trait]
pub trait DealStore: Send + Sync {
    /// Active deals matching `query`.
    async fn find(&self, query: &DealQuery) -> Result<Vec<Deal>, RepositoryError>;

    /// A deal by id.
    async fn get(
        &self,
        id: DealId,
        include_inactive: bool,
    ) -> Result<Option<Deal>, RepositoryError>;

    /// Highest id in use, active or not.
    async fn max_id(&self) -> Result<Option<DealId>, RepositoryError>;

    /// Insert a new deal. Returns `RepositoryError::Conflict` if the id is
    /// taken.
    async fn insert(&self, deal: &Deal) -> Result<Deal, RepositoryError>;

    /// Overwrite the active deal with the same id.
    async fn update(&self, deal: &Deal) -> Result<Option<Deal>, RepositoryError>;

    /// Set the active flag on a deal regardless of its current state.
    async fn set_active(
        &self,
        id: DealId,
        active: bool,
    ) -> Result<Option<Deal>, RepositoryError>;

    /// Physically remove a deal.
    async fn remove(&self, id: DealId) -> Result<Option<Deal>, RepositoryError>;

    /// Replace every deal.
    async fn replace_all(&self, deals: Vec<Deal>) -> Result<u64, RepositoryError>;

    /// Aggregate statistics over active deals.
    async fn stats(&self) -> Result<DealStats, RepositoryError>;
}
