//! `PostgreSQL` deal store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use techmart_core::{CurrencyCode, DealId, ProductId, Sku};

use super::RepositoryError;
use crate::models::{Deal, DealStats};
use crate::search::escape_like;
use crate::store::{DealOrder, DealQuery, DealStore};

const DEAL_COLUMNS: &str = "deal_id, product_id, variant_sku, department, title, description, \
     short_description, thumbnail, image, price, original_price, currency, rating, discount, \
     is_active, start_date, end_date, created_at, last_updated";

#[derive(Debug, FromRow)]
struct DealRow {
    deal_id: DealId,
    product_id: ProductId,
    variant_sku: Sku,
    department: String,
    title: String,
    description: Option<String>,
    short_description: Option<String>,
    thumbnail: Option<String>,
    image: Option<String>,
    price: Decimal,
    original_price: Option<Decimal>,
    currency: String,
    rating: Decimal,
    discount: Option<Decimal>,
    is_active: bool,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl TryFrom<DealRow> for Deal {
    type Error = RepositoryError;

    fn try_from(row: DealRow) -> Result<Self, Self::Error> {
        let currency = row.currency.parse::<CurrencyCode>().map_err(|e| {
            RepositoryError::DataCorruption(format!("deal {}: {e}", row.deal_id))
        })?;

        Ok(Self {
            deal_id: row.deal_id,
            product_id: row.product_id,
            variant_sku: row.variant_sku,
            department: row.department,
            title: row.title,
            description: row.description,
            short_description: row.short_description,
            thumbnail: row.thumbnail,
            image: row.image,
            price: row.price,
            original_price: row.original_price,
            currency,
            rating: row.rating,
            discount: row.discount,
            is_active: row.is_active,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
            last_updated: row.last_updated,
        })
    }
}

#[derive(Debug, FromRow)]
struct StatsRow {
    total_deals: i64,
    average_price: Decimal,
    average_rating: Decimal,
    min_price: Decimal,
    max_price: Decimal,
    unique_products: i64,
    departments: Vec<String>,
}

fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("deal id already exists".to_owned());
    }
    RepositoryError::Database(e)
}

fn rows_to_deals(rows: Vec<DealRow>) -> Result<Vec<Deal>, RepositoryError> {
    rows.into_iter().map(Deal::try_from).collect()
}

fn push_insert_values(builder: &mut QueryBuilder<'_, Postgres>, deal: &Deal) {
    builder.push("(");
    let mut values = builder.separated(", ");
    values.push_bind(deal.deal_id);
    values.push_bind(deal.product_id);
    values.push_bind(deal.variant_sku.clone());
    values.push_bind(deal.department.clone());
    values.push_bind(deal.title.clone());
    values.push_bind(deal.description.clone());
    values.push_bind(deal.short_description.clone());
    values.push_bind(deal.thumbnail.clone());
    values.push_bind(deal.image.clone());
    values.push_bind(deal.price);
    values.push_bind(deal.original_price);
    values.push_bind(deal.currency.code());
    values.push_bind(deal.rating);
    values.push_bind(deal.discount);
    values.push_bind(deal.is_active);
    values.push_bind(deal.start_date);
    values.push_bind(deal.end_date);
    values.push_bind(deal.created_at);
    values.push_bind(deal.last_updated);
    builder.push(")");
}

fn push_ilike(builder: &mut QueryBuilder<'_, Postgres>, column: &str, pattern: &str) {
    builder.push(column);
    builder.push(" ILIKE ");
    builder.push_bind(pattern.to_owned());
    builder.push(" ESCAPE '\\'");
}

/// Deal store backed by the `catalog.deal` table.
#[derive(Debug, Clone)]
pub struct PgDealStore {
    pool: PgPool,
}

impl PgDealStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DealStore for PgDealStore {
    #[tracing::instrument(skip(self), err)]
    async fn find(&self, query: &DealQuery) -> Result<Vec<Deal>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder.push(DEAL_COLUMNS);
        builder.push(" FROM catalog.deal WHERE is_active");

        if let Some(term) = &query.text {
            let pattern = format!("%{}%", escape_like(term));
            builder.push(" AND (");
            for (i, column) in ["title", "description", "short_description", "department"]
                .into_iter()
                .enumerate()
            {
                if i > 0 {
                    builder.push(" OR ");
                }
                push_ilike(&mut builder, column, &pattern);
            }
            builder.push(")");
        }
        if let Some(department) = &query.department {
            builder.push(" AND ");
            push_ilike(
                &mut builder,
                "department",
                &format!("%{}%", escape_like(department)),
            );
        }
        if let Some(product_id) = query.product_id {
            builder.push(" AND product_id = ");
            builder.push_bind(product_id);
        }
        if let Some((min, max)) = query.price_range {
            builder.push(" AND price BETWEEN ");
            builder.push_bind(min);
            builder.push(" AND ");
            builder.push_bind(max);
        }
        if let Some(rating) = query.min_rating {
            builder.push(" AND rating >= ");
            builder.push_bind(rating);
        }
        if let Some(since) = query.updated_since {
            builder.push(" AND last_updated >= ");
            builder.push_bind(since);
        }

        builder.push(match query.order {
            DealOrder::Recent => " ORDER BY last_updated DESC, deal_id DESC",
            DealOrder::RatingDesc => " ORDER BY rating DESC, last_updated DESC, deal_id",
            DealOrder::PriceAsc => " ORDER BY price, deal_id",
        });
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }

        let rows: Vec<DealRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows_to_deals(rows)
    }

    async fn get(
        &self,
        id: DealId,
        include_inactive: bool,
    ) -> Result<Option<Deal>, RepositoryError> {
        let sql = format!(
            "SELECT {DEAL_COLUMNS} FROM catalog.deal WHERE deal_id = $1 AND (is_active OR $2)"
        );
        let row: Option<DealRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(include_inactive)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Deal::try_from).transpose()
    }

    async fn max_id(&self) -> Result<Option<DealId>, RepositoryError> {
        let max: Option<DealId> = sqlx::query_scalar("SELECT MAX(deal_id) FROM catalog.deal")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    #[tracing::instrument(skip(self, deal), fields(deal_id = %deal.deal_id), err)]
    async fn insert(&self, deal: &Deal) -> Result<Deal, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO catalog.deal (");
        builder.push(DEAL_COLUMNS);
        builder.push(") VALUES ");
        push_insert_values(&mut builder, deal);
        builder.push(" RETURNING ");
        builder.push(DEAL_COLUMNS);

        let row: DealRow = builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Deal::try_from(row)
    }

    #[tracing::instrument(skip(self, deal), fields(deal_id = %deal.deal_id), err)]
    async fn update(&self, deal: &Deal) -> Result<Option<Deal>, RepositoryError> {
        let sql = format!(
            "UPDATE catalog.deal SET product_id = $2, variant_sku = $3, department = $4, \
             title = $5, description = $6, short_description = $7, thumbnail = $8, image = $9, \
             price = $10, original_price = $11, currency = $12, rating = $13, discount = $14, \
             start_date = $15, end_date = $16, last_updated = $17 \
             WHERE deal_id = $1 AND is_active RETURNING {DEAL_COLUMNS}"
        );
        let row: Option<DealRow> = sqlx::query_as(&sql)
            .bind(deal.deal_id)
            .bind(deal.product_id)
            .bind(&deal.variant_sku)
            .bind(&deal.department)
            .bind(&deal.title)
            .bind(&deal.description)
            .bind(&deal.short_description)
            .bind(&deal.thumbnail)
            .bind(&deal.image)
            .bind(deal.price)
            .bind(deal.original_price)
            .bind(deal.currency.code())
            .bind(deal.rating)
            .bind(deal.discount)
            .bind(deal.start_date)
            .bind(deal.end_date)
            .bind(deal.last_updated)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Deal::try_from).transpose()
    }

    async fn set_active(
        &self,
        id: DealId,
        active: bool,
    ) -> Result<Option<Deal>, RepositoryError> {
        let sql = format!(
            "UPDATE catalog.deal SET is_active = $2, last_updated = now() \
             WHERE deal_id = $1 RETURNING {DEAL_COLUMNS}"
        );
        let row: Option<DealRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Deal::try_from).transpose()
    }

    async fn remove(&self, id: DealId) -> Result<Option<Deal>, RepositoryError> {
        let sql = format!("DELETE FROM catalog.deal WHERE deal_id = $1 RETURNING {DEAL_COLUMNS}");
        let row: Option<DealRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Deal::try_from).transpose()
    }

    #[tracing::instrument(skip(self, deals), fields(count = deals.len()), err)]
    async fn replace_all(&self, deals: Vec<Deal>) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM catalog.deal")
            .execute(&mut *tx)
            .await?;

        let mut inserted = 0;
        for chunk in deals.chunks(500) {
            let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO catalog.deal (");
            builder.push(DEAL_COLUMNS);
            builder.push(") VALUES ");
            for (i, deal) in chunk.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_insert_values(&mut builder, deal);
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

    async fn stats(&self) -> Result<DealStats, RepositoryError> {
        let row: StatsRow = sqlx::query_as(
            "SELECT COUNT(*) AS total_deals, \
                 COALESCE(ROUND(AVG(price), 2), 0) AS average_price, \
                 COALESCE(ROUND(AVG(rating), 2), 0) AS average_rating, \
                 COALESCE(MIN(price), 0) AS min_price, \
                 COALESCE(MAX(price), 0) AS max_price, \
                 COUNT(DISTINCT product_id) AS unique_products, \
                 COALESCE(array_agg(DISTINCT department), '{}') AS departments \
             FROM catalog.deal WHERE is_active",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DealStats {
            total_deals: row.total_deals,
            average_price: row.average_price,
            average_rating: row.average_rating,
            min_price: row.min_price,
            max_price: row.max_price,
            department_count: row.departments.len(),
            unique_products: row.unique_products,
            departments: row.departments,
        })
    }
}
