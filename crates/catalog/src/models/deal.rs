//! Deal domain models.
//!
//! A deal is a time-boxed promotion of one product variant. Deals share the
//! catalog's soft-delete and money rules but are addressed by their own
//! `dealId`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use techmart_core::{CurrencyCode, DealId, ProductId, Sku};

/// Highest allowed discount percentage.
pub const MAX_DISCOUNT: Decimal = Decimal::ONE_HUNDRED;

/// A promotional deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub deal_id: DealId,
    pub product_id: ProductId,
    pub variant_sku: Sku,
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
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    /// Percentage off, `0..=100`.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Request body for creating a deal, also the shape of deal seed records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeal {
    #[serde(default)]
    pub deal_id: Option<DealId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub variant_sku: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub rating: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial deal update. `dealId` is immutable and ignored if present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealPatch {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub variant_sku: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub rating: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// Aggregate statistics over active deals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DealStats {
    pub total_deals: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_rating: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_price: Decimal,
    pub department_count: usize,
    pub unique_products: i64,
    pub departments: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_deal_accepts_ui_payload() {
        let deal: NewDeal = serde_json::from_value(serde_json::json!({
            "productId": 301671,
            "variantSku": "KB-001-BLK",
            "department": "Computers",
            "title": "Keyboard week",
            "price": 59.5,
            "originalPrice": 89.99,
            "discount": 33,
            "endDate": "2026-11-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(deal.product_id, Some(ProductId::new(301_671)));
        assert_eq!(deal.price, Some(Decimal::new(595, 1)));
        assert_eq!(deal.discount, Some(Decimal::from(33)));
        assert!(deal.deal_id.is_none());
        assert!(deal.end_date.is_some());
    }
}
