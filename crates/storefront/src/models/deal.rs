//! Catalog deals as seen by the storefront.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use techmart_core::{CurrencyCode, DealId, ProductId};

/// A promotional deal returned by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub deal_id: DealId,
    pub product_id: ProductId,
    pub variant_sku: String,
    pub department: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Deal {
    /// Amount saved against the original price, if one is known.
    #[must_use]
    pub fn savings(&self) -> Option<Decimal> {
        self.original_price
            .map(|original| (original - self.price).max(Decimal::ZERO))
    }

    /// Whether the deal has ended as of `now`.
    #[must_use]
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| end < now)
    }
}

/// Filters for `GET /deals`. Unset fields are left off the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealFilter {
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub department: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl DealFilter {
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        for (key, value) in [("search", &self.search), ("department", &self.department)] {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                pairs.push((key, value.to_owned()));
            }
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        pairs
    }
}
