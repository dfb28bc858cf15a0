//! Deal business rules.
//!
//! Deals reuse the catalog's money, rating and soft-delete conventions.
//! Listing filters are fixed per operation (top rated means rating 4.0 and
//! up, recent means updated within the last 30 days).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use techmart_core::{DealId, ProductId, round_money};

use super::catalog::{
    CatalogError, effective_limit, non_empty, validate_price, validate_rating, validate_sku,
    validate_title,
};
use crate::models::{Deal, DealPatch, DealStats, MAX_DISCOUNT, NewDeal};
use crate::store::{DealOrder, DealQuery, DealStore};

/// Id given to the first deal when none exist.
pub const FIRST_DEAL_ID: DealId = DealId::new(9241);

/// Default page size for deal listings.
pub const DEFAULT_DEAL_LIMIT: i64 = 50;

/// Default page size for deal search and the recent listing.
pub const DEFAULT_DEAL_SEARCH_LIMIT: i64 = 20;

/// Default page size for the top-rated listing.
pub const DEFAULT_TOP_RATED_LIMIT: i64 = 10;

/// Lowest rating that counts as top rated.
pub const TOP_RATED_MIN: Decimal = Decimal::from_parts(40, 0, 0, false, 1);

/// How far back the recent listing looks.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Optional filters for the deal listing.
#[derive(Debug, Clone, Default)]
pub struct DealFilter {
    pub search: Option<String>,
    pub department: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Parse a path deal id, rejecting anything that is not a positive integer.
///
/// # Errors
///
/// Returns `CatalogError::Validation` for non-numeric or non-positive input.
pub fn parse_deal_id(raw: &str) -> Result<DealId, CatalogError> {
    DealId::parse(raw).map_err(|e| CatalogError::Validation(e.to_string()))
}

fn positive<T: Copy + Into<i32> + std::fmt::Display>(
    id: T,
    what: &str,
) -> Result<T, CatalogError> {
    if id.into() <= 0 {
        return Err(CatalogError::Validation(format!(
            "invalid {what} {id}: must be a positive integer"
        )));
    }
    Ok(id)
}

fn validate_department(raw: String) -> Result<String, CatalogError> {
    let department = raw.trim().to_owned();
    if department.is_empty() {
        return Err(CatalogError::Validation(
            "Department is required".to_owned(),
        ));
    }
    Ok(department)
}

fn validate_discount(discount: Decimal) -> Result<Decimal, CatalogError> {
    if discount < Decimal::ZERO || discount > MAX_DISCOUNT {
        return Err(CatalogError::Validation(
            "Discount must be between 0 and 100".to_owned(),
        ));
    }
    Ok(round_money(discount))
}

fn validate_window(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<(), CatalogError> {
    if end.is_some_and(|end| end < start) {
        return Err(CatalogError::Validation(
            "End date must not precede start date".to_owned(),
        ));
    }
    Ok(())
}

/// Deal operations over a deal store.
#[derive(Clone)]
pub struct DealService {
    store: Arc<dyn DealStore>,
}

impl std::fmt::Debug for DealService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DealService").finish_non_exhaustive()
    }
}

impl DealService {
    #[must_use]
    pub fn new(store: Arc<dyn DealStore>) -> Self {
        Self { store }
    }

    async fn find(
        &self,
        query: DealQuery,
        context: &'static str,
    ) -> Result<Vec<Deal>, CatalogError> {
        self.store
            .find(&query)
            .await
            .map_err(CatalogError::store(context))
    }

    /// Turn a creation request into a stored deal, without id assignment.
    fn build(input: NewDeal, deal_id: DealId, now: DateTime<Utc>) -> Result<Deal, CatalogError> {
        let title = validate_title(input.title.unwrap_or_default())?;
        let price = validate_price(
            input
                .price
                .ok_or_else(|| CatalogError::Validation("Price is required".to_owned()))?,
        )?;
        let product_id = positive(
            input
                .product_id
                .ok_or_else(|| CatalogError::Validation("Product id is required".to_owned()))?,
            "product id",
        )?;
        let variant_sku = validate_sku(input.variant_sku.as_deref().unwrap_or_default())?;
        let department = validate_department(input.department.unwrap_or_default())?;
        let start_date = input.start_date.unwrap_or(now);
        validate_window(start_date, input.end_date)?;

        Ok(Deal {
            deal_id,
            product_id,
            variant_sku,
            department,
            title,
            description: input.description,
            short_description: input.short_description,
            thumbnail: input.thumbnail,
            image: input.image,
            price,
            original_price: input.original_price.map(validate_price).transpose()?,
            currency: input.currency.unwrap_or_default(),
            rating: validate_rating(input.rating.unwrap_or_default())?,
            discount: input.discount.map(validate_discount).transpose()?,
            is_active: true,
            start_date,
            end_date: input.end_date,
            created_at: now,
            last_updated: now,
        })
    }

    /// Active deals, filtered with precedence search > department > price
    /// range.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: DealFilter,
        limit: Option<i64>,
    ) -> Result<Vec<Deal>, CatalogError> {
        if let Some(term) = non_empty(filter.search) {
            return self.search(&term, limit).await;
        }
        if let Some(department) = non_empty(filter.department) {
            return self.by_department(&department, limit).await;
        }
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            return self.by_price_range(min, max, limit).await;
        }

        let query = DealQuery::default().limit(effective_limit(limit, DEFAULT_DEAL_LIMIT));
        self.find(query, "fetching deals").await
    }

    /// The active deal with this id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DealNotFound` if there is no active deal with
    /// this id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: DealId) -> Result<Deal, CatalogError> {
        self.store
            .get(id, false)
            .await
            .map_err(CatalogError::store("fetching deal"))?
            .ok_or(CatalogError::DealNotFound)
    }

    /// Create a deal, assigning the next id when none is given.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if a constraint is violated and
    /// `CatalogError::Conflict` if the id is already in use.
    #[instrument(skip(self, input), fields(product_id = ?input.product_id))]
    pub async fn create(&self, input: NewDeal) -> Result<Deal, CatalogError> {
        const CONTEXT: &str = "creating deal";

        let deal_id = match input.deal_id.map(|id| positive(id, "deal id")).transpose()? {
            Some(id) => {
                if self
                    .store
                    .get(id, true)
                    .await
                    .map_err(CatalogError::store(CONTEXT))?
                    .is_some()
                {
                    return Err(CatalogError::Conflict(format!(
                        "Deal id {id} already exists"
                    )));
                }
                id
            }
            None => self
                .store
                .max_id()
                .await
                .map_err(CatalogError::store(CONTEXT))?
                .map_or(FIRST_DEAL_ID, |max| max.next()),
        };

        let deal = Self::build(input, deal_id, Utc::now())?;
        let created = self
            .store
            .insert(&deal)
            .await
            .map_err(CatalogError::store(CONTEXT))?;
        tracing::info!(deal_id = %created.deal_id, product_id = %created.product_id, "Deal created");
        Ok(created)
    }

    /// Apply a partial update to an active deal. The deal id never changes.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DealNotFound` if there is no active deal with
    /// this id and `CatalogError::Validation` for constraint violations.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: DealId, patch: DealPatch) -> Result<Deal, CatalogError> {
        let mut deal = self.get(id).await?;

        if let Some(product_id) = patch.product_id {
            deal.product_id = positive(product_id, "product id")?;
        }
        if let Some(raw) = patch.variant_sku {
            deal.variant_sku = validate_sku(&raw)?;
        }
        if let Some(department) = patch.department {
            deal.department = validate_department(department)?;
        }
        if let Some(title) = patch.title {
            deal.title = validate_title(title)?;
        }
        if let Some(price) = patch.price {
            deal.price = validate_price(price)?;
        }
        if let Some(original) = patch.original_price {
            deal.original_price = Some(validate_price(original)?);
        }
        if let Some(rating) = patch.rating {
            deal.rating = validate_rating(rating)?;
        }
        if let Some(discount) = patch.discount {
            deal.discount = Some(validate_discount(discount)?);
        }
        if let Some(currency) = patch.currency {
            deal.currency = currency;
        }
        if let Some(start) = patch.start_date {
            deal.start_date = start;
        }
        if patch.end_date.is_some() {
            deal.end_date = patch.end_date;
        }
        validate_window(deal.start_date, deal.end_date)?;
        if patch.description.is_some() {
            deal.description = patch.description;
        }
        if patch.short_description.is_some() {
            deal.short_description = patch.short_description;
        }
        if patch.thumbnail.is_some() {
            deal.thumbnail = patch.thumbnail;
        }
        if patch.image.is_some() {
            deal.image = patch.image;
        }
        deal.last_updated = Utc::now();

        self.store
            .update(&deal)
            .await
            .map_err(CatalogError::store("updating deal"))?
            .ok_or(CatalogError::DealNotFound)
    }

    /// Soft-delete a deal.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DealNotFound` if no deal has this id.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: DealId) -> Result<Deal, CatalogError> {
        let deal = self
            .store
            .set_active(id, false)
            .await
            .map_err(CatalogError::store("deleting deal"))?
            .ok_or(CatalogError::DealNotFound)?;
        tracing::info!(%id, "Deal soft-deleted");
        Ok(deal)
    }

    /// Physically remove a deal.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DealNotFound` if no deal has this id.
    #[instrument(skip(self))]
    pub async fn hard_delete(&self, id: DealId) -> Result<Deal, CatalogError> {
        let deal = self
            .store
            .remove(id)
            .await
            .map_err(CatalogError::store("hard deleting deal"))?
            .ok_or(CatalogError::DealNotFound)?;
        tracing::warn!(%id, "Deal permanently deleted");
        Ok(deal)
    }

    /// Re-activate a soft-deleted deal.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DealNotFound` if no deal has this id.
    #[instrument(skip(self))]
    pub async fn restore(&self, id: DealId) -> Result<Deal, CatalogError> {
        self.store
            .set_active(id, true)
            .await
            .map_err(CatalogError::store("restoring deal"))?
            .ok_or(CatalogError::DealNotFound)
    }

    /// Deals whose department contains `department`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn by_department(
        &self,
        department: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Deal>, CatalogError> {
        let query = DealQuery::default()
            .department(department)
            .limit(effective_limit(limit, DEFAULT_DEAL_LIMIT));
        self.find(query, "fetching deals by department").await
    }

    /// Deals for one product, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn by_product(
        &self,
        product_id: ProductId,
        limit: Option<i64>,
    ) -> Result<Vec<Deal>, CatalogError> {
        let query = DealQuery::default()
            .product(product_id)
            .limit(effective_limit(limit, DEFAULT_DEAL_LIMIT));
        self.find(query, "fetching deals by product").await
    }

    /// Deals priced within `[min, max]`, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn by_price_range(
        &self,
        min: Decimal,
        max: Decimal,
        limit: Option<i64>,
    ) -> Result<Vec<Deal>, CatalogError> {
        let query = DealQuery::default()
            .price_range(min, max)
            .order(DealOrder::PriceAsc)
            .limit(effective_limit(limit, DEFAULT_DEAL_LIMIT));
        self.find(query, "fetching deals by price range").await
    }

    /// Case-insensitive search over title, descriptions and department,
    /// highest rated first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str, limit: Option<i64>) -> Result<Vec<Deal>, CatalogError> {
        let query = DealQuery::default()
            .text(term)
            .order(DealOrder::RatingDesc)
            .limit(effective_limit(limit, DEFAULT_DEAL_SEARCH_LIMIT));
        self.find(query, "searching deals").await
    }

    /// Deals rated 4.0 or higher.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn top_rated(&self, limit: Option<i64>) -> Result<Vec<Deal>, CatalogError> {
        let query = DealQuery::default()
            .min_rating(TOP_RATED_MIN)
            .order(DealOrder::RatingDesc)
            .limit(effective_limit(limit, DEFAULT_TOP_RATED_LIMIT));
        self.find(query, "fetching top rated deals").await
    }

    /// Deals updated within the last 30 days, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn recent(&self, limit: Option<i64>) -> Result<Vec<Deal>, CatalogError> {
        let query = DealQuery::default()
            .updated_since(Utc::now() - Duration::days(RECENT_WINDOW_DAYS))
            .limit(effective_limit(limit, DEFAULT_DEAL_SEARCH_LIMIT));
        self.find(query, "fetching recent deals").await
    }

    /// Aggregate statistics over active deals.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn stats(&self) -> Result<DealStats, CatalogError> {
        self.store
            .stats()
            .await
            .map_err(CatalogError::store("fetching deal statistics"))
    }

    /// Replace every deal with `records`. Records without a `dealId` are
    /// numbered after the highest explicit one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if a record violates a deal
    /// constraint and `CatalogError::Conflict` for duplicate ids.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn bulk_load(&self, records: Vec<NewDeal>) -> Result<u64, CatalogError> {
        let now = Utc::now();
        let explicit = records
            .iter()
            .filter_map(|r| r.deal_id)
            .map(|id| positive(id, "deal id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut next = explicit
            .into_iter()
            .max()
            .map_or(FIRST_DEAL_ID, |max| max.next());

        let mut deals = Vec::with_capacity(records.len());
        for record in records {
            let id = record.deal_id.unwrap_or_else(|| {
                let id = next;
                next = next.next();
                id
            });
            deals.push(Self::build(record, id, now)?);
        }

        let loaded = self
            .store
            .replace_all(deals)
            .await
            .map_err(CatalogError::store("loading deals"))?;
        tracing::info!(loaded, "Deals replaced from seed data");
        Ok(loaded)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryDealStore;

    fn service() -> DealService {
        DealService::new(Arc::new(MemoryDealStore::new()))
    }

    fn deal(title: &str, department: &str, price: i64, rating: Decimal) -> NewDeal {
        NewDeal {
            product_id: Some(ProductId::new(301_671)),
            variant_sku: Some(format!("{}-V1", title.replace(' ', "-"))),
            department: Some(department.to_owned()),
            title: Some(title.to_owned()),
            price: Some(Decimal::from(price)),
            rating: Some(rating),
            ..NewDeal::default()
        }
    }

    #[tokio::test]
    async fn test_first_deal_gets_seed_id_then_increments() {
        let service = service();
        let first = service
            .create(deal("Keyboard week", "Computers", 60, Decimal::from(4)))
            .await
            .unwrap();
        let second = service
            .create(deal("Mouse week", "Computers", 20, Decimal::from(3)))
            .await
            .unwrap();
        assert_eq!(first.deal_id, FIRST_DEAL_ID);
        assert_eq!(second.deal_id, DealId::new(9242));
    }

    #[tokio::test]
    async fn test_create_requires_product_and_rejects_taken_id() {
        let service = service();
        let err = service
            .create(NewDeal {
                product_id: None,
                ..deal("Lamp", "Home", 10, Decimal::ZERO)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let explicit = NewDeal {
            deal_id: Some(DealId::new(12)),
            ..deal("Lamp", "Home", 10, Decimal::ZERO)
        };
        service.create(explicit.clone()).await.unwrap();
        let err = service.create(explicit).await.unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));

        let err = service
            .create(NewDeal {
                deal_id: Some(DealId::new(0)),
                ..deal("Lamp", "Home", 10, Decimal::ZERO)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn test_discount_and_window_are_validated() {
        let service = service();
        let err = service
            .create(NewDeal {
                discount: Some(Decimal::from(101)),
                ..deal("Lamp", "Home", 10, Decimal::ZERO)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let start = Utc::now();
        let err = service
            .create(NewDeal {
                start_date: Some(start),
                end_date: Some(start - Duration::days(1)),
                ..deal("Lamp", "Home", 10, Decimal::ZERO)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_soft_delete_hides_deal() {
        let service = service();
        let created = service
            .create(deal("Desk week", "Furniture", 200, Decimal::from(4)))
            .await
            .unwrap();

        let updated = service
            .update(
                created.deal_id,
                DealPatch {
                    price: Some(Decimal::new(17_999, 2)),
                    ..DealPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.deal_id, created.deal_id);
        assert_eq!(updated.price, Decimal::new(17_999, 2));
        assert!(updated.last_updated >= created.last_updated);

        service.delete(created.deal_id).await.unwrap();
        assert!(matches!(
            service.get(created.deal_id).await,
            Err(CatalogError::DealNotFound)
        ));
        assert!(matches!(
            service.update(created.deal_id, DealPatch::default()).await,
            Err(CatalogError::DealNotFound)
        ));

        service.restore(created.deal_id).await.unwrap();
        service.hard_delete(created.deal_id).await.unwrap();
        assert!(matches!(
            service.restore(created.deal_id).await,
            Err(CatalogError::DealNotFound)
        ));
    }

    #[tokio::test]
    async fn test_listing_filters_and_orders() {
        let service = service();
        service
            .create(deal("Gaming Laptop", "Computers", 1200, Decimal::new(48, 1)))
            .await
            .unwrap();
        service
            .create(deal("Office Chair", "Furniture", 150, Decimal::new(41, 1)))
            .await
            .unwrap();
        service
            .create(deal("Laptop Sleeve", "Accessories", 25, Decimal::new(35, 1)))
            .await
            .unwrap();

        let found = service.search("laptop", None).await.unwrap();
        let titles: Vec<_> = found.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["Gaming Laptop", "Laptop Sleeve"]);

        let top = service.top_rated(None).await.unwrap();
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|d| d.rating >= TOP_RATED_MIN));

        let cheap = service
            .by_price_range(Decimal::ZERO, Decimal::from(200), None)
            .await
            .unwrap();
        assert_eq!(cheap[0].title, "Laptop Sleeve");
        assert_eq!(cheap.len(), 2);

        let furniture = service.by_department("furn", None).await.unwrap();
        assert_eq!(furniture.len(), 1);

        let filtered = service
            .list(
                DealFilter {
                    search: Some("chair".to_owned()),
                    department: Some("Computers".to_owned()),
                    ..DealFilter::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Office Chair");

        assert_eq!(service.recent(None).await.unwrap().len(), 3);
        assert_eq!(
            service
                .by_product(ProductId::new(301_671), Some(2))
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_stats_round_averages() {
        let service = service();
        service
            .create(deal("A", "Computers", 10, Decimal::from(4)))
            .await
            .unwrap();
        service
            .create(deal("B", "Computers", 20, Decimal::from(3)))
            .await
            .unwrap();
        service
            .create(deal("C", "Home", 11, Decimal::from(5)))
            .await
            .unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_deals, 3);
        assert_eq!(stats.average_price, Decimal::new(1367, 2));
        assert_eq!(stats.average_rating, Decimal::from(4));
        assert_eq!(stats.min_price, Decimal::from(10));
        assert_eq!(stats.max_price, Decimal::from(20));
        assert_eq!(stats.departments, ["Computers", "Home"]);
        assert_eq!(stats.department_count, 2);
        assert_eq!(stats.unique_products, 1);
    }

    #[tokio::test]
    async fn test_bulk_load_numbers_records_after_explicit_ids() {
        let service = service();
        service
            .create(deal("Old", "Home", 5, Decimal::ZERO))
            .await
            .unwrap();

        let loaded = service
            .bulk_load(vec![
                NewDeal {
                    deal_id: Some(DealId::new(20)),
                    ..deal("Explicit", "Home", 5, Decimal::ZERO)
                },
                deal("Implicit", "Home", 6, Decimal::ZERO),
            ])
            .await
            .unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(service.get(DealId::new(21)).await.unwrap().title, "Implicit");
        assert!(service.get(FIRST_DEAL_ID).await.is_err());
    }
}
