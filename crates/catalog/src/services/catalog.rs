//! Catalog business rules.
//!
//! Validation, id assignment, SKU uniqueness and the listing filters live
//! here; storage is delegated to a [`ProductStore`].

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use techmart_core::{ProductId, Sku, round_money};

use crate::db::RepositoryError;
use crate::models::{
    MAX_PRICE, MAX_RATING, NewProduct, Product, ProductPatch, ProductStats, SeedProduct,
};
use crate::search::{MatchMode, SearchField, TextQuery};
use crate::store::{ProductOrder, ProductQuery, ProductStore};

/// Id given to the first product of an empty catalog.
pub const FIRST_PRODUCT_ID: ProductId = ProductId::new(301_671);

/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Default page size for free-text search.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Default low-stock threshold.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No (active) product matched.
    #[error("Product not found")]
    NotFound,

    /// No (active) deal matched.
    #[error("Deal not found")]
    DealNotFound,

    /// The request is malformed or violates a product constraint.
    #[error("{0}")]
    Validation(String),

    /// The request collides with an existing product.
    #[error("{0}")]
    Conflict(String),

    /// The store failed.
    #[error("error {context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl CatalogError {
    pub(crate) fn store(context: &'static str) -> impl FnOnce(RepositoryError) -> Self {
        move |source| match source {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::NotFound => Self::NotFound,
            source => Self::Store { context, source },
        }
    }
}

/// Optional filters for the product listing.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub search: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Catalog operations over a product store.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ProductStore>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

/// Parse a path id, rejecting anything that is not a positive integer.
///
/// # Errors
///
/// Returns `CatalogError::Validation` for non-numeric or non-positive input.
pub fn parse_product_id(raw: &str) -> Result<ProductId, CatalogError> {
    ProductId::parse(raw).map_err(|e| CatalogError::Validation(e.to_string()))
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

pub(crate) fn effective_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.filter(|l| *l > 0).unwrap_or(default)
}

/// Client-supplied ids follow the same rule as path ids.
fn validate_id(id: ProductId) -> Result<ProductId, CatalogError> {
    if id.as_i32() <= 0 {
        return Err(CatalogError::Validation(format!(
            "invalid id {id}: must be a positive integer"
        )));
    }
    Ok(id)
}

/// Prices are stored in cents, so they are rounded before the range check.
pub(crate) fn validate_price(price: Decimal) -> Result<Decimal, CatalogError> {
    if price < Decimal::ZERO {
        return Err(CatalogError::Validation(
            "Price must be zero or greater".to_owned(),
        ));
    }
    let price = round_money(price);
    if price > MAX_PRICE {
        return Err(CatalogError::Validation(format!(
            "Price must not exceed {MAX_PRICE}"
        )));
    }
    Ok(price)
}

pub(crate) fn validate_rating(rating: Decimal) -> Result<Decimal, CatalogError> {
    if rating < Decimal::ZERO || rating > MAX_RATING {
        return Err(CatalogError::Validation(
            "Rating must be between 0 and 5".to_owned(),
        ));
    }
    Ok(round_money(rating))
}

fn validate_stock(stock: i64) -> Result<i32, CatalogError> {
    if stock < 0 {
        return Err(CatalogError::Validation(
            "Stock must be a non-negative number".to_owned(),
        ));
    }
    i32::try_from(stock).map_err(|_| CatalogError::Validation("Stock is too large".to_owned()))
}

pub(crate) fn validate_sku(raw: &str) -> Result<Sku, CatalogError> {
    Sku::parse(raw).map_err(|e| CatalogError::Validation(e.to_string()))
}

pub(crate) fn validate_title(raw: String) -> Result<String, CatalogError> {
    let title = raw.trim().to_owned();
    if title.is_empty() {
        return Err(CatalogError::Validation("Title cannot be empty".to_owned()));
    }
    Ok(title)
}

impl CatalogService {
    /// Create a service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    async fn find(
        &self,
        query: ProductQuery,
        context: &'static str,
    ) -> Result<Vec<Product>, CatalogError> {
        self.store
            .find(&query)
            .await
            .map_err(CatalogError::store(context))
    }

    /// Active products, filtered with precedence
    /// search > department > category > brand > price range.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: ListFilter,
        limit: Option<i64>,
    ) -> Result<Vec<Product>, CatalogError> {
        if let Some(term) = non_empty(filter.search) {
            return self.search(&term, limit, MatchMode::Substring).await;
        }
        if let Some(department) = non_empty(filter.department) {
            return self.by_department(&department, limit).await;
        }
        if let Some(category) = non_empty(filter.category) {
            return self.by_category(&category, limit).await;
        }
        if let Some(brand) = non_empty(filter.brand) {
            return self.by_brand(&brand, limit).await;
        }
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            return self.by_price_range(min, max, limit).await;
        }

        let query = ProductQuery::default()
            .order(ProductOrder::Newest)
            .limit(effective_limit(limit, DEFAULT_LIST_LIMIT));
        self.find(query, "fetching products").await
    }

    /// The active product with this id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if there is no active product with
    /// this id, or `CatalogError::Store` if the store fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.store
            .get(id, false)
            .await
            .map_err(CatalogError::store("fetching product"))?
            .ok_or(CatalogError::NotFound)
    }

    /// The active product whose SKU matches exactly.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no active product has this SKU.
    #[instrument(skip(self))]
    pub async fn get_by_sku(&self, sku: &str) -> Result<Product, CatalogError> {
        let query = ProductQuery::default()
            .text(TextQuery::new(MatchMode::Exact, &[SearchField::Sku], sku))
            .limit(1);
        self.find(query, "fetching product by SKU")
            .await?
            .into_iter()
            .next()
            .ok_or(CatalogError::NotFound)
    }

    /// Create a product, assigning the next id when none is given.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if a constraint is violated and
    /// `CatalogError::Conflict` if the SKU or id is already in use.
    #[instrument(skip(self, input), fields(sku = ?input.sku))]
    pub async fn create(&self, input: NewProduct) -> Result<Product, CatalogError> {
        const CONTEXT: &str = "creating product";

        let title = validate_title(input.title.unwrap_or_default())?;
        let price = validate_price(
            input
                .price
                .ok_or_else(|| CatalogError::Validation("Price is required".to_owned()))?,
        )?;
        let sku = validate_sku(input.sku.as_deref().unwrap_or_default())?;
        let rating = validate_rating(input.rating.unwrap_or_default())?;
        let stock = validate_stock(input.stock.unwrap_or_default())?;

        if self
            .store
            .sku_exists(&sku, None)
            .await
            .map_err(CatalogError::store(CONTEXT))?
        {
            return Err(CatalogError::Conflict("SKU already exists".to_owned()));
        }

        let id = match input.id.map(validate_id).transpose()? {
            Some(id) => {
                if self
                    .store
                    .get(id, true)
                    .await
                    .map_err(CatalogError::store(CONTEXT))?
                    .is_some()
                {
                    return Err(CatalogError::Conflict(format!(
                        "Product id {id} already exists"
                    )));
                }
                id
            }
            None => self
                .store
                .max_id()
                .await
                .map_err(CatalogError::store(CONTEXT))?
                .map_or(FIRST_PRODUCT_ID, |max| max.next()),
        };

        let now = Utc::now();
        let product = Product {
            id,
            sku,
            title,
            description: input.description,
            price,
            currency: input.currency.unwrap_or_default(),
            category: input.category,
            department: input.department,
            image: input.image,
            stock,
            rating,
            brand: input.brand,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .store
            .insert(&product)
            .await
            .map_err(CatalogError::store(CONTEXT))?;
        tracing::info!(id = %created.id, sku = %created.sku, "Product created");
        Ok(created)
    }

    /// Apply a partial update to an active product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if there is no active product with
    /// this id, `CatalogError::Validation` for constraint violations and
    /// `CatalogError::Conflict` if the new SKU is taken.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, CatalogError> {
        const CONTEXT: &str = "updating product";

        let mut product = self.get(id).await?;

        if let Some(raw) = patch.sku {
            let sku = validate_sku(&raw)?;
            if sku != product.sku
                && self
                    .store
                    .sku_exists(&sku, Some(id))
                    .await
                    .map_err(CatalogError::store(CONTEXT))?
            {
                return Err(CatalogError::Conflict("SKU already exists".to_owned()));
            }
            product.sku = sku;
        }
        if let Some(title) = patch.title {
            product.title = validate_title(title)?;
        }
        if let Some(price) = patch.price {
            product.price = validate_price(price)?;
        }
        if let Some(rating) = patch.rating {
            product.rating = validate_rating(rating)?;
        }
        if let Some(stock) = patch.stock {
            product.stock = validate_stock(stock)?;
        }
        if let Some(currency) = patch.currency {
            product.currency = currency;
        }
        if patch.description.is_some() {
            product.description = patch.description;
        }
        if patch.category.is_some() {
            product.category = patch.category;
        }
        if patch.department.is_some() {
            product.department = patch.department;
        }
        if patch.image.is_some() {
            product.image = patch.image;
        }
        if patch.brand.is_some() {
            product.brand = patch.brand;
        }
        product.updated_at = Utc::now();

        self.store
            .update(&product)
            .await
            .map_err(CatalogError::store(CONTEXT))?
            .ok_or(CatalogError::NotFound)
    }

    /// Soft-delete a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this id.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<Product, CatalogError> {
        let product = self
            .store
            .set_active(id, false)
            .await
            .map_err(CatalogError::store("deleting product"))?
            .ok_or(CatalogError::NotFound)?;
        tracing::info!(%id, "Product soft-deleted");
        Ok(product)
    }

    /// Physically remove a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this id.
    #[instrument(skip(self))]
    pub async fn hard_delete(&self, id: ProductId) -> Result<Product, CatalogError> {
        let product = self
            .store
            .remove(id)
            .await
            .map_err(CatalogError::store("hard deleting product"))?
            .ok_or(CatalogError::NotFound)?;
        tracing::warn!(%id, sku = %product.sku, "Product permanently deleted");
        Ok(product)
    }

    /// Re-activate a soft-deleted product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this id.
    #[instrument(skip(self))]
    pub async fn restore(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.store
            .set_active(id, true)
            .await
            .map_err(CatalogError::store("restoring product"))?
            .ok_or(CatalogError::NotFound)
    }

    /// Set the stock level of an active product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for a negative or missing stock and
    /// `CatalogError::NotFound` if there is no active product with this id.
    #[instrument(skip(self))]
    pub async fn update_stock(
        &self,
        id: ProductId,
        stock: Option<i64>,
    ) -> Result<Product, CatalogError> {
        let stock = stock.ok_or_else(|| {
            CatalogError::Validation("Stock must be a non-negative number".to_owned())
        })?;
        let stock = validate_stock(stock)?;
        self.store
            .set_stock(id, stock)
            .await
            .map_err(CatalogError::store("updating stock"))?
            .ok_or(CatalogError::NotFound)
    }

    /// Case-insensitive search over title, description, department,
    /// category, brand and SKU, highest rated first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        term: &str,
        limit: Option<i64>,
        mode: MatchMode,
    ) -> Result<Vec<Product>, CatalogError> {
        let query = ProductQuery::default()
            .text(TextQuery::new(mode, &SearchField::ALL, term))
            .order(ProductOrder::RatingDesc)
            .limit(effective_limit(limit, DEFAULT_SEARCH_LIMIT));
        self.find(query, "searching products").await
    }

    async fn by_field(
        &self,
        field: SearchField,
        value: &str,
        limit: Option<i64>,
        context: &'static str,
    ) -> Result<Vec<Product>, CatalogError> {
        let query = ProductQuery::default()
            .text(TextQuery::contains(&[field], value))
            .order(ProductOrder::RatingDesc)
            .limit(effective_limit(limit, DEFAULT_LIST_LIMIT));
        self.find(query, context).await
    }

    /// Products whose department contains `department`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn by_department(
        &self,
        department: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Product>, CatalogError> {
        self.by_field(
            SearchField::Department,
            department,
            limit,
            "fetching products by department",
        )
        .await
    }

    /// Products whose category contains `category`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn by_category(
        &self,
        category: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Product>, CatalogError> {
        self.by_field(
            SearchField::Category,
            category,
            limit,
            "fetching products by category",
        )
        .await
    }

    /// Products whose brand contains `brand`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn by_brand(
        &self,
        brand: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Product>, CatalogError> {
        self.by_field(SearchField::Brand, brand, limit, "fetching products by brand")
            .await
    }

    /// Products priced within `[min, max]`, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn by_price_range(
        &self,
        min: Decimal,
        max: Decimal,
        limit: Option<i64>,
    ) -> Result<Vec<Product>, CatalogError> {
        let query = ProductQuery::default()
            .price_range(min, max)
            .order(ProductOrder::PriceAsc)
            .limit(effective_limit(limit, DEFAULT_LIST_LIMIT));
        self.find(query, "fetching products by price range").await
    }

    /// Active products with `stock <= threshold`, lowest stock first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn low_stock(&self, threshold: Option<i32>) -> Result<Vec<Product>, CatalogError> {
        let threshold = threshold
            .filter(|t| *t > 0)
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        let query = ProductQuery::default()
            .max_stock(threshold)
            .order(ProductOrder::StockAsc);
        self.find(query, "fetching low stock products").await
    }

    /// Aggregate statistics over active products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn stats(&self) -> Result<ProductStats, CatalogError> {
        self.store
            .stats()
            .await
            .map_err(CatalogError::store("fetching product statistics"))
    }

    /// Replace the whole catalog with `records`, flattening legacy ones.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if a record violates a product
    /// constraint, `CatalogError::Conflict` for duplicate ids or SKUs.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn bulk_load(&self, records: Vec<SeedProduct>) -> Result<u64, CatalogError> {
        let now = Utc::now();
        let products = records
            .into_iter()
            .map(|record| flatten_seed(record, now))
            .collect::<Result<Vec<_>, _>>()?;

        let loaded = self
            .store
            .replace_all(products)
            .await
            .map_err(CatalogError::store("loading initial data"))?;
        tracing::info!(loaded, "Catalog replaced from seed data");
        Ok(loaded)
    }
}

/// Turn a seed record into a stored product.
fn flatten_seed(
    record: SeedProduct,
    now: chrono::DateTime<Utc>,
) -> Result<Product, CatalogError> {
    let sku = validate_sku(&record.resolved_sku())?;
    let brand = record.resolved_brand();
    let image = record.resolved_image();
    let created_at = record.resolved_created_at(now);

    Ok(Product {
        id: validate_id(record.id)?,
        sku,
        title: validate_title(record.title)?,
        description: record.description,
        price: validate_price(record.price)?,
        currency: record.currency.unwrap_or_default(),
        category: record.category,
        department: record.department,
        image,
        stock: validate_stock(i64::from(record.stock.unwrap_or_default()))?,
        rating: validate_rating(record.rating.unwrap_or_default())?,
        brand: Some(brand),
        is_active: true,
        created_at,
        updated_at: now,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryProductStore;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemoryProductStore::new()))
    }

    fn new_product(sku: &str, title: &str, price: i64) -> NewProduct {
        NewProduct {
            sku: Some(sku.to_owned()),
            title: Some(title.to_owned()),
            price: Some(Decimal::from(price)),
            ..NewProduct::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let svc = service();
        let first = svc.create(new_product("A-1", "Keyboard", 50)).await.unwrap();
        let second = svc.create(new_product("A-2", "Mouse", 20)).await.unwrap();
        assert_eq!(first.id, FIRST_PRODUCT_ID);
        assert_eq!(second.id, ProductId::new(301_672));
        assert!(first.is_active);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_sku() {
        let svc = service();
        svc.create(new_product("A-1", "Keyboard", 50)).await.unwrap();
        let err = svc
            .create(new_product("A-1", "Other", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let svc = service();
        let mut input = new_product("A-1", "Keyboard", 50);
        input.id = Some(ProductId::new(7));
        svc.create(input.clone()).await.unwrap();
        input.sku = Some("A-2".to_owned());
        assert!(matches!(
            svc.create(input).await.unwrap_err(),
            CatalogError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let svc = service();
        let cases = [
            NewProduct {
                title: Some("  ".to_owned()),
                ..new_product("A-1", "x", 1)
            },
            NewProduct {
                price: None,
                ..new_product("A-1", "Keyboard", 1)
            },
            NewProduct {
                price: Some(Decimal::from(-1)),
                ..new_product("A-1", "Keyboard", 1)
            },
            NewProduct {
                sku: None,
                ..new_product("A-1", "Keyboard", 1)
            },
            NewProduct {
                rating: Some(Decimal::new(51, 1)),
                ..new_product("A-1", "Keyboard", 1)
            },
            NewProduct {
                stock: Some(-3),
                ..new_product("A-1", "Keyboard", 1)
            },
        ];
        for input in cases {
            assert!(matches!(
                svc.create(input).await.unwrap_err(),
                CatalogError::Validation(_)
            ));
        }
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_id() {
        let svc = service();
        for raw in [0, -5] {
            let input = NewProduct {
                id: Some(ProductId::new(raw)),
                ..new_product("A-1", "Keyboard", 1)
            };
            assert!(matches!(
                svc.create(input).await.unwrap_err(),
                CatalogError::Validation(_)
            ));
        }
        let assigned = svc.create(new_product("A-1", "Keyboard", 1)).await.unwrap();
        assert_eq!(assigned.id, FIRST_PRODUCT_ID);
    }

    #[tokio::test]
    async fn test_price_and_rating_are_stored_in_cents() {
        let svc = service();
        let p = svc
            .create(NewProduct {
                price: Some(Decimal::new(19_999, 3)),
                rating: Some(Decimal::new(4_567, 3)),
                ..new_product("A-1", "Keyboard", 1)
            })
            .await
            .unwrap();
        assert_eq!(p.price, Decimal::new(2_000, 2));
        assert_eq!(p.rating, Decimal::new(457, 2));

        let updated = svc
            .update(
                p.id,
                ProductPatch {
                    price: Some(Decimal::new(12_345, 3)),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, Decimal::new(1_235, 2));
    }

    #[tokio::test]
    async fn test_price_above_column_range_is_rejected() {
        let svc = service();
        let too_big = NewProduct {
            price: Some(Decimal::from(1_000_000_000_000_i64)),
            ..new_product("A-1", "Keyboard", 1)
        };
        assert!(matches!(
            svc.create(too_big).await.unwrap_err(),
            CatalogError::Validation(_)
        ));
        let at_max = NewProduct {
            price: Some(MAX_PRICE),
            ..new_product("A-1", "Keyboard", 1)
        };
        assert_eq!(svc.create(at_max).await.unwrap().price, MAX_PRICE);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_product() {
        let svc = service();
        let p = svc.create(new_product("A-1", "Keyboard", 50)).await.unwrap();
        svc.delete(p.id).await.unwrap();
        assert!(matches!(svc.get(p.id).await, Err(CatalogError::NotFound)));
        assert!(matches!(
            svc.update(p.id, ProductPatch::default()).await,
            Err(CatalogError::NotFound)
        ));
        assert!(svc.list(ListFilter::default(), None).await.unwrap().is_empty());

        let restored = svc.restore(p.id).await.unwrap();
        assert!(restored.is_active);
        assert_eq!(svc.get(p.id).await.unwrap().sku, p.sku);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.delete(ProductId::new(99)).await,
            Err(CatalogError::NotFound)
        ));
        assert!(matches!(
            svc.hard_delete(ProductId::new(99)).await,
            Err(CatalogError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_is_partial_and_checks_sku() {
        let svc = service();
        let p = svc.create(new_product("A-1", "Keyboard", 50)).await.unwrap();
        svc.create(new_product("A-2", "Mouse", 20)).await.unwrap();

        let updated = svc
            .update(
                p.id,
                ProductPatch {
                    price: Some(Decimal::from(45)),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, Decimal::from(45));
        assert_eq!(updated.title, "Keyboard");
        assert_eq!(updated.id, p.id);

        let err = svc
            .update(
                p.id,
                ProductPatch {
                    sku: Some("A-2".to_owned()),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_search_matches_single_title() {
        let svc = service();
        svc.create(new_product("A-1", "Mechanical Keyboard", 80)).await.unwrap();
        svc.create(new_product("A-2", "Wireless Mouse", 20)).await.unwrap();
        let found = svc.search("keyb", None, MatchMode::Substring).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Mechanical Keyboard");
    }

    #[tokio::test]
    async fn test_search_orders_by_rating() {
        let svc = service();
        for (sku, rating) in [("A-1", 30), ("A-2", 45), ("A-3", 10)] {
            svc.create(NewProduct {
                rating: Some(Decimal::new(rating, 1)),
                ..new_product(sku, "Cable", 5)
            })
            .await
            .unwrap();
        }
        let found = svc.search("cable", Some(2), MatchMode::Substring).await.unwrap();
        let skus: Vec<&str> = found.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, ["A-2", "A-1"]);
    }

    #[tokio::test]
    async fn test_list_filter_precedence() {
        let svc = service();
        svc.create(NewProduct {
            department: Some("Audio".to_owned()),
            brand: Some("Sonic".to_owned()),
            ..new_product("A-1", "Speaker", 100)
        })
        .await
        .unwrap();
        svc.create(NewProduct {
            department: Some("Computers".to_owned()),
            brand: Some("Sonic".to_owned()),
            ..new_product("A-2", "Laptop", 900)
        })
        .await
        .unwrap();

        // department wins over brand
        let filter = ListFilter {
            department: Some("audio".to_owned()),
            brand: Some("sonic".to_owned()),
            ..ListFilter::default()
        };
        let found = svc.list(filter, None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Speaker");

        let filter = ListFilter {
            min_price: Some(Decimal::from(500)),
            max_price: Some(Decimal::from(1000)),
            ..ListFilter::default()
        };
        let found = svc.list(filter, None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Laptop");
    }

    #[tokio::test]
    async fn test_get_by_sku_is_exact() {
        let svc = service();
        svc.create(new_product("LAP-001", "Laptop", 900)).await.unwrap();
        assert!(svc.get_by_sku("LAP-001").await.is_ok());
        assert!(matches!(
            svc.get_by_sku("lap-001").await,
            Err(CatalogError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_low_stock_and_stock_update() {
        let svc = service();
        let p = svc
            .create(NewProduct {
                stock: Some(50),
                ..new_product("A-1", "Keyboard", 50)
            })
            .await
            .unwrap();
        assert!(svc.low_stock(None).await.unwrap().is_empty());

        svc.update_stock(p.id, Some(4)).await.unwrap();
        let low = svc.low_stock(None).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].stock, 4);

        assert!(matches!(
            svc.update_stock(p.id, Some(-1)).await,
            Err(CatalogError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_rounds_averages() {
        let svc = service();
        for (sku, price, dept) in [("A-1", 10, "Audio"), ("A-2", 20, "Audio"), ("A-3", 15, "Video")] {
            svc.create(NewProduct {
                department: Some(dept.to_owned()),
                stock: Some(3),
                ..new_product(sku, "Thing", price)
            })
            .await
            .unwrap();
        }
        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.average_price, Decimal::from(15));
        assert_eq!(stats.total_stock, 9);
        assert_eq!(stats.min_price, Decimal::from(10));
        assert_eq!(stats.max_price, Decimal::from(20));
        assert_eq!(stats.departments, ["Audio", "Video"]);
        assert_eq!(stats.department_count, 2);
    }

    #[tokio::test]
    async fn test_bulk_load_replaces_catalog() {
        let svc = service();
        svc.create(new_product("OLD-1", "Old", 1)).await.unwrap();

        let records: Vec<SeedProduct> = serde_json::from_value(serde_json::json!([
            {"_id": 1, "title": "Legacy", "price": 10.0, "variants": [{"sku": "LEG-1"}]},
            {"_id": 2, "title": "Flat", "price": 12.5, "sku": "FLAT-2", "brand": "Acme"}
        ]))
        .unwrap();
        assert_eq!(svc.bulk_load(records).await.unwrap(), 2);

        assert!(matches!(
            svc.get_by_sku("OLD-1").await,
            Err(CatalogError::NotFound)
        ));
        let legacy = svc.get(ProductId::new(1)).await.unwrap();
        assert_eq!(legacy.sku.as_str(), "LEG-1");
        assert_eq!(legacy.brand.as_deref(), Some("Unknown"));

        let next = svc.create(new_product("NEW-1", "New", 1)).await.unwrap();
        assert_eq!(next.id, ProductId::new(3));
    }

    #[tokio::test]
    async fn test_bulk_load_rejects_non_positive_id() {
        let svc = service();
        let records: Vec<SeedProduct> = serde_json::from_value(serde_json::json!([
            {"_id": 0, "title": "Zero", "price": 1.0, "sku": "ZERO-0"}
        ]))
        .unwrap();
        assert!(matches!(
            svc.bulk_load(records).await.unwrap_err(),
            CatalogError::Validation(_)
        ));
    }

    #[test]
    fn test_parse_product_id() {
        assert!(parse_product_id("42").is_ok());
        assert!(matches!(
            parse_product_id("abc"),
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            parse_product_id("-5"),
            Err(CatalogError::Validation(_))
        ));
    }
}
