//! In-memory product store.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use techmart_core::{ProductId, Sku, round_money};

use super::{ProductOrder, ProductQuery, ProductStore};
use crate::db::RepositoryError;
use crate::models::{Product, ProductStats};

/// A [`ProductStore`] kept in a map behind an async `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: RwLock<BTreeMap<ProductId, Product>>,
}

impl MemoryProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_products(products: &mut [Product], order: ProductOrder) {
    match order {
        ProductOrder::Newest => products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        }),
        ProductOrder::RatingDesc => {
            products.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.id.cmp(&b.id)));
        }
        ProductOrder::PriceAsc => {
            products.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)));
        }
        ProductOrder::StockAsc => {
            products.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.id.cmp(&b.id)));
        }
    }
}

pub(super) fn average(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    round_money(sum / Decimal::from(count))
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut found: Vec<Product> = products
            .values()
            .filter(|p| p.is_active)
            .filter(|p| query.text.as_ref().is_none_or(|text| text.matches(p)))
            .filter(|p| {
                query
                    .price_range
                    .is_none_or(|(min, max)| p.price >= min && p.price <= max)
            })
            .filter(|p| query.max_stock.is_none_or(|max| p.stock <= max))
            .cloned()
            .collect();
        drop(products);

        sort_products(&mut found, query.order);
        if let Some(limit) = query.limit {
            found.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(found)
    }

    async fn get(
        &self,
        id: ProductId,
        include_inactive: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .products
            .read()
            .await
            .get(&id)
            .filter(|p| include_inactive || p.is_active)
            .cloned())
    }

    async fn sku_exists(
        &self,
        sku: &Sku,
        except: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .any(|p| &p.sku == sku && Some(p.id) != except))
    }

    async fn max_id(&self) -> Result<Option<ProductId>, RepositoryError> {
        Ok(self.products.read().await.keys().next_back().copied())
    }

    async fn insert(&self, product: &Product) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(RepositoryError::Conflict(format!(
                "product id {} already exists",
                product.id
            )));
        }
        if products.values().any(|p| p.sku == product.sku) {
            return Err(RepositoryError::Conflict("SKU already exists".to_owned()));
        }
        products.insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn update(&self, product: &Product) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.products.write().await;
        if products
            .values()
            .any(|p| p.sku == product.sku && p.id != product.id)
        {
            return Err(RepositoryError::Conflict("SKU already exists".to_owned()));
        }
        match products.get_mut(&product.id) {
            Some(existing) if existing.is_active => {
                *existing = product.clone();
                Ok(Some(product.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_active(
        &self,
        id: ProductId,
        active: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(&id).map(|p| {
            p.is_active = active;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn set_stock(
        &self,
        id: ProductId,
        stock: i32,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(&id).filter(|p| p.is_active).map(|p| {
            p.stock = stock;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn remove(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.write().await.remove(&id))
    }

    async fn replace_all(&self, products: Vec<Product>) -> Result<u64, RepositoryError> {
        let mut replacement = BTreeMap::new();
        let mut skus = BTreeSet::new();
        for product in products {
            if !skus.insert(product.sku.clone()) {
                return Err(RepositoryError::Conflict(format!(
                    "duplicate SKU {} in bulk load",
                    product.sku
                )));
            }
            if replacement.insert(product.id, product).is_some() {
                return Err(RepositoryError::Conflict(
                    "duplicate product id in bulk load".to_owned(),
                ));
            }
        }
        let count = replacement.len() as u64;
        *self.products.write().await = replacement;
        Ok(count)
    }

    async fn stats(&self) -> Result<ProductStats, RepositoryError> {
        let products = self.products.read().await;
        let active: Vec<&Product> = products.values().filter(|p| p.is_active).collect();
        if active.is_empty() {
            return Ok(ProductStats::default());
        }

        let departments: BTreeSet<String> =
            active.iter().filter_map(|p| p.department.clone()).collect();
        let brands: BTreeSet<String> = active.iter().filter_map(|p| p.brand.clone()).collect();
        let categories: BTreeSet<String> =
            active.iter().filter_map(|p| p.category.clone()).collect();

        Ok(ProductStats {
            total_products: i64::try_from(active.len()).unwrap_or(i64::MAX),
            average_price: average(active.iter().map(|p| p.price).sum(), active.len()),
            average_rating: average(active.iter().map(|p| p.rating).sum(), active.len()),
            total_stock: active.iter().map(|p| i64::from(p.stock)).sum(),
            min_price: active.iter().map(|p| p.price).min().unwrap_or_default(),
            max_price: active.iter().map(|p| p.price).max().unwrap_or_default(),
            department_count: departments.len(),
            brand_count: brands.len(),
            category_count: categories.len(),
            departments: departments.into_iter().collect(),
            brands: brands.into_iter().collect(),
            categories: categories.into_iter().collect(),
        })
    }
}
