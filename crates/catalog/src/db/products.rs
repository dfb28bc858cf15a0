//! `PostgreSQL` product store.
//!
//! Queries are assembled at runtime with `QueryBuilder` because the filter
//! shape varies per request; rows decode through [`ProductRow`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use techmart_core::{CurrencyCode, ProductId, Sku};

use super::RepositoryError;
use crate::models::{Product, ProductStats};
use crate::store::{ProductOrder, ProductQuery, ProductStore};

const PRODUCT_COLUMNS: &str = "id, sku, title, description, price, currency, category, \
     department, image, stock, rating, brand, is_active, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ProductRow {
    id: ProductId,
    sku: Sku,
    title: String,
    description: Option<String>,
    price: Decimal,
    currency: String,
    category: Option<String>,
    department: Option<String>,
    image: Option<String>,
    stock: i32,
    rating: Decimal,
    brand: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let currency = row.currency.parse::<CurrencyCode>().map_err(|e| {
            RepositoryError::DataCorruption(format!("product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            sku: row.sku,
            title: row.title,
            description: row.description,
            price: row.price,
            currency,
            category: row.category,
            department: row.department,
            image: row.image,
            stock: row.stock,
            rating: row.rating,
            brand: row.brand,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StatsRow {
    total_products: i64,
    average_price: Decimal,
    average_rating: Decimal,
    total_stock: i64,
    min_price: Decimal,
    max_price: Decimal,
    departments: Vec<String>,
    brands: Vec<String>,
    categories: Vec<String>,
}

/// Map unique-key violations to `Conflict`.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let what = match db_err.constraint() {
            Some(c) if c.contains("sku") => "SKU already exists",
            _ => "product id already exists",
        };
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(e)
}

fn rows_to_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

fn push_insert_values(builder: &mut QueryBuilder<'_, Postgres>, product: &Product) {
    builder.push("(");
    let mut values = builder.separated(", ");
    values.push_bind(product.id);
    values.push_bind(product.sku.clone());
    values.push_bind(product.title.clone());
    values.push_bind(product.description.clone());
    values.push_bind(product.price);
    values.push_bind(product.currency.code());
    values.push_bind(product.category.clone());
    values.push_bind(product.department.clone());
    values.push_bind(product.image.clone());
    values.push_bind(product.stock);
    values.push_bind(product.rating);
    values.push_bind(product.brand.clone());
    values.push_bind(product.is_active);
    values.push_bind(product.created_at);
    values.push_bind(product.updated_at);
    builder.push(")");
}

/// Product store backed by the `catalog.product` table.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    #[tracing::instrument(skip(self), err)]
    async fn find(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder.push(PRODUCT_COLUMNS);
        builder.push(" FROM catalog.product WHERE is_active");

        if let Some(text) = &query.text {
            builder.push(" AND ");
            text.push_sql(&mut builder);
        }
        if let Some((min, max)) = query.price_range {
            builder.push(" AND price BETWEEN ");
            builder.push_bind(min);
            builder.push(" AND ");
            builder.push_bind(max);
        }
        if let Some(threshold) = query.max_stock {
            builder.push(" AND stock <= ");
            builder.push_bind(threshold);
        }

        builder.push(match query.order {
            ProductOrder::Newest => " ORDER BY created_at DESC, id DESC",
            ProductOrder::RatingDesc => " ORDER BY rating DESC, id",
            ProductOrder::PriceAsc => " ORDER BY price, id",
            ProductOrder::StockAsc => " ORDER BY stock, id",
        });
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows_to_products(rows)
    }

    async fn get(
        &self,
        id: ProductId,
        include_inactive: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product WHERE id = $1 AND (is_active OR $2)"
        );
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(include_inactive)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    async fn sku_exists(
        &self,
        sku: &Sku,
        except: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM catalog.product \
             WHERE sku = $1 AND ($2::INTEGER IS NULL OR id <> $2))",
        )
        .bind(sku)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn max_id(&self) -> Result<Option<ProductId>, RepositoryError> {
        let max: Option<ProductId> = sqlx::query_scalar("SELECT MAX(id) FROM catalog.product")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    #[tracing::instrument(skip(self, product), fields(id = %product.id, sku = %product.sku), err)]
    async fn insert(&self, product: &Product) -> Result<Product, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO catalog.product (");
        builder.push(PRODUCT_COLUMNS);
        builder.push(") VALUES ");
        push_insert_values(&mut builder, product);
        builder.push(" RETURNING ");
        builder.push(PRODUCT_COLUMNS);

        let row: ProductRow = builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Product::try_from(row)
    }

    #[tracing::instrument(skip(self, product), fields(id = %product.id), err)]
    async fn update(&self, product: &Product) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "UPDATE catalog.product SET sku = $2, title = $3, description = $4, price = $5, \
             currency = $6, category = $7, department = $8, image = $9, stock = $10, \
             rating = $11, brand = $12, updated_at = $13 \
             WHERE id = $1 AND is_active RETURNING {PRODUCT_COLUMNS}"
        );
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(product.id)
            .bind(&product.sku)
            .bind(&product.title)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.currency.code())
            .bind(&product.category)
            .bind(&product.department)
            .bind(&product.image)
            .bind(product.stock)
            .bind(product.rating)
            .bind(&product.brand)
            .bind(product.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.map(Product::try_from).transpose()
    }

    async fn set_active(
        &self,
        id: ProductId,
        active: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "UPDATE catalog.product SET is_active = $2, updated_at = now() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    async fn set_stock(
        &self,
        id: ProductId,
        stock: i32,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "UPDATE catalog.product SET stock = $2, updated_at = now() \
             WHERE id = $1 AND is_active RETURNING {PRODUCT_COLUMNS}"
        );
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(stock)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    async fn remove(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("DELETE FROM catalog.product WHERE id = $1 RETURNING {PRODUCT_COLUMNS}");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    #[tracing::instrument(skip(self, products), fields(count = products.len()), err)]
    async fn replace_all(&self, products: Vec<Product>) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM catalog.product")
            .execute(&mut *tx)
            .await?;

        let mut inserted = 0;
        // Stay well below the bind-parameter limit per statement.
        for chunk in products.chunks(500) {
            let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO catalog.product (");
            builder.push(PRODUCT_COLUMNS);
            builder.push(") VALUES ");
            for (i, product) in chunk.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_insert_values(&mut builder, product);
            }
            inserted += builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(map_write_error)?
                .rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn stats(&self) -> Result<ProductStats, RepositoryError> {
        let row: StatsRow = sqlx::query_as(
            "SELECT COUNT(*) AS total_products, \
                 COALESCE(ROUND(AVG(price), 2), 0) AS average_price, \
                 COALESCE(ROUND(AVG(rating), 2), 0) AS average_rating, \
                 COALESCE(SUM(stock), 0)::BIGINT AS total_stock, \
                 COALESCE(MIN(price), 0) AS min_price, \
                 COALESCE(MAX(price), 0) AS max_price, \
                 COALESCE(array_agg(DISTINCT department) FILTER (WHERE department IS NOT NULL), '{}') AS departments, \
                 COALESCE(array_agg(DISTINCT brand) FILTER (WHERE brand IS NOT NULL), '{}') AS brands, \
                 COALESCE(array_agg(DISTINCT category) FILTER (WHERE category IS NOT NULL), '{}') AS categories \
             FROM catalog.product WHERE is_active",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ProductStats {
            total_products: row.total_products,
            average_price: row.average_price,
            average_rating: row.average_rating,
            total_stock: row.total_stock,
            min_price: row.min_price,
            max_price: row.max_price,
            department_count: row.departments.len(),
            brand_count: row.brands.len(),
            category_count: row.categories.len(),
            departments: row.departments,
            brands: row.brands,
            categories: row.categories,
        })
    }
}
