//! Product domain models.
//!
//! `Product` is the stored, flattened shape. `NewProduct` and `ProductPatch`
//! are request bodies whose constraints are checked by the catalog service.
//! `SeedProduct` accepts both the flattened shape and the older
//! variant-nested records used by seed files.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use techmart_core::{CurrencyCode, ProductId, Sku};

/// Highest allowed rating.
pub const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Highest storable price, `9_999_999_999.99` (`NUMERIC(12, 2)`).
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub sku: Sku,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    #[serde(default)]
    pub brand: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a product.
///
/// Every field is optional at the wire level so that missing values are
/// reported as validation errors rather than decode failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(default, alias = "_id")]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub brand: Option<String>,
}

/// Request body for a partial product update. Absent fields are left as is;
/// an `id` in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub brand: Option<String>,
}

/// Request body for a stock update.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StockUpdate {
    pub stock: Option<i64>,
}

/// Aggregate statistics over active products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub total_products: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_rating: Decimal,
    pub total_stock: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_price: Decimal,
    pub department_count: usize,
    pub brand_count: usize,
    pub category_count: usize,
    pub departments: Vec<String>,
    pub brands: Vec<String>,
    pub categories: Vec<String>,
}

/// A variant of a legacy seed record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedVariant {
    #[serde(default)]
    pub sku: Option<String>,
}

/// A product record as found in seed files.
///
/// Accepts the flattened shape as well as legacy records where the SKU lives
/// in `variants[0].sku`, the brand in `attributes.brand` and the image may
/// only be present as `thumbnail`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProduct {
    #[serde(alias = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub sku: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub variants: Vec<SeedVariant>,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
    /// Free-form timestamp; only RFC 3339 values are honored.
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl SeedProduct {
    /// SKU for the flattened product: explicit `sku`, then the first
    /// variant's SKU, then `SKU-<id>`.
    #[must_use]
    pub fn resolved_sku(&self) -> String {
        self.sku
            .as_deref()
            .or_else(|| self.variants.first().and_then(|v| v.sku.as_deref()))
            .filter(|s| !s.trim().is_empty())
            .map_or_else(|| Sku::fallback_for(self.id).to_string(), str::to_owned)
    }

    /// Brand for the flattened product: explicit `brand`, then
    /// `attributes.brand`, then `Unknown`.
    #[must_use]
    pub fn resolved_brand(&self) -> String {
        self.brand
            .clone()
            .or_else(|| {
                self.attributes
                    .get("brand")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| "Unknown".to_owned())
    }

    /// Creation time for the flattened product: `lastUpdated` when it is a
    /// valid RFC 3339 timestamp, otherwise `now`.
    #[must_use]
    pub fn resolved_created_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.last_updated
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map_or(now, |t| t.with_timezone(&Utc))
    }

    /// Image for the flattened product, falling back to the thumbnail.
    #[must_use]
    pub fn resolved_image(&self) -> Option<String> {
        self.image.clone().or_else(|| self.thumbnail.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_accepts_legacy_id_alias() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "_id": 301671,
            "sku": "LAP-001",
            "title": "Laptop",
            "price": 999.99,
            "isActive": true,
            "createdAt": "2025-07-10T00:00:00Z",
            "updatedAt": "2025-07-10T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(product.id, ProductId::new(301_671));
        assert_eq!(product.currency, CurrencyCode::USD);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_product_serializes_camel_case_numbers() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 5,
            "sku": "A-1",
            "title": "Cable",
            "price": 9.5,
            "rating": 4.25,
            "isActive": true,
            "createdAt": "2025-07-10T00:00:00Z",
            "updatedAt": "2025-07-10T00:00:00Z"
        }))
        .unwrap();
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"], serde_json::json!(9.5));
        assert_eq!(json["rating"], serde_json::json!(4.25));
        assert_eq!(json["isActive"], serde_json::json!(true));
    }

    #[test]
    fn test_seed_product_flattens_legacy_record() {
        let seed: SeedProduct = serde_json::from_value(serde_json::json!({
            "_id": 301680,
            "title": "Headphones",
            "price": 59.0,
            "thumbnail": "thumb.png",
            "variants": [{"sku": "HP-RED"}, {"sku": "HP-BLUE"}],
            "attributes": {"brand": "Sonic", "color": "red"}
        }))
        .unwrap();
        assert_eq!(seed.resolved_sku(), "HP-RED");
        assert_eq!(seed.resolved_brand(), "Sonic");
        assert_eq!(seed.resolved_image().as_deref(), Some("thumb.png"));
    }

    #[test]
    fn test_seed_product_fallbacks() {
        let seed: SeedProduct = serde_json::from_value(serde_json::json!({
            "id": 42,
            "title": "Mystery box",
            "price": 1.0
        }))
        .unwrap();
        assert_eq!(seed.resolved_sku(), "SKU-42");
        assert_eq!(seed.resolved_brand(), "Unknown");
        assert!(seed.resolved_image().is_none());
    }
}
