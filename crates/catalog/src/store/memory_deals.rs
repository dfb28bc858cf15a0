//! In-memory deal store.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use techmart_core::DealId;

use super::memory::average;
use super::{DealOrder, DealQuery, DealStore};
use crate::db::RepositoryError;
use crate::models::{Deal, DealStats};

/// A [`DealStore`] kept in a map behind an async `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryDealStore {
    deals: RwLock<BTreeMap<DealId, Deal>>,
}

impl MemoryDealStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_deals(deals: &mut [Deal], order: DealOrder) {
    match order {
        DealOrder::Recent => deals.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| b.deal_id.cmp(&a.deal_id))
        }),
        DealOrder::RatingDesc => deals.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then_with(|| b.last_updated.cmp(&a.last_updated))
                .then_with(|| a.deal_id.cmp(&b.deal_id))
        }),
        DealOrder::PriceAsc => {
            deals.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.deal_id.cmp(&b.deal_id)));
        }
    }
}

#[async_trait]
impl DealStore for MemoryDealStore {
    async fn find(&self, query: &DealQuery) -> Result<Vec<Deal>, RepositoryError> {
        let deals = self.deals.read().await;
        let mut found: Vec<Deal> = deals
            .values()
            .filter(|d| d.is_active && query.matches(d))
            .cloned()
            .collect();
        drop(deals);

        sort_deals(&mut found, query.order);
        if let Some(limit) = query.limit {
            found.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(found)
    }

    async fn get(
        &self,
        id: DealId,
        include_inactive: bool,
    ) -> Result<Option<Deal>, RepositoryError> {
        Ok(self
            .deals
            .read()
            .await
            .get(&id)
            .filter(|d| include_inactive || d.is_active)
            .cloned())
    }

    async fn max_id(&self) -> Result<Option<DealId>, RepositoryError> {
        Ok(self.deals.read().await.keys().next_back().copied())
    }

    async fn insert(&self, deal: &Deal) -> Result<Deal, RepositoryError> {
        let mut deals = self.deals.write().await;
        if deals.contains_key(&deal.deal_id) {
            return Err(RepositoryError::Conflict(format!(
                "deal id {} already exists",
                deal.deal_id
            )));
        }
        deals.insert(deal.deal_id, deal.clone());
        Ok(deal.clone())
    }

    async fn update(&self, deal: &Deal) -> Result<Option<Deal>, RepositoryError> {
        let mut deals = self.deals.write().await;
        match deals.get_mut(&deal.deal_id) {
            Some(existing) if existing.is_active => {
                *existing = deal.clone();
                Ok(Some(deal.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_active(
        &self,
        id: DealId,
        active: bool,
    ) -> Result<Option<Deal>, RepositoryError> {
        let mut deals = self.deals.write().await;
        Ok(deals.get_mut(&id).map(|d| {
            d.is_active = active;
            d.last_updated = Utc::now();
            d.clone()
        }))
    }

    async fn remove(&self, id: DealId) -> Result<Option<Deal>, RepositoryError> {
        Ok(self.deals.write().await.remove(&id))
    }

    async fn replace_all(&self, deals: Vec<Deal>) -> Result<u64, RepositoryError> {
        let mut replacement = BTreeMap::new();
        for deal in deals {
            if replacement.insert(deal.deal_id, deal).is_some() {
                return Err(RepositoryError::Conflict(
                    "duplicate deal id in bulk load".to_owned(),
                ));
            }
        }
        let count = replacement.len() as u64;
        *self.deals.write().await = replacement;
        Ok(count)
    }

    async fn stats(&self) -> Result<DealStats, RepositoryError> {
        let deals = self.deals.read().await;
        let active: Vec<&Deal> = deals.values().filter(|d| d.is_active).collect();
        if active.is_empty() {
            return Ok(DealStats::default());
        }

        let departments: BTreeSet<String> = active.iter().map(|d| d.department.clone()).collect();
        let products: BTreeSet<_> = active.iter().map(|d| d.product_id).collect();

        Ok(DealStats {
            total_deals: i64::try_from(active.len()).unwrap_or(i64::MAX),
            average_price: average(active.iter().map(|d| d.price).sum(), active.len()),
            average_rating: average(active.iter().map(|d| d.rating).sum(), active.len()),
            min_price: active.iter().map(|d| d.price).min().unwrap_or_default(),
            max_price: active.iter().map(|d| d.price).max().unwrap_or_default(),
            department_count: departments.len(),
            unique_products: i64::try_from(products.len()).unwrap_or(i64::MAX),
            departments: departments.into_iter().collect(),
        })
    }
}
