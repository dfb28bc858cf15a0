//! Shopping cart shapes shared with the cart service.
//!
//! The cart service speaks camelCase JSON with numeric prices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, UserId};
use super::price::{CurrencyCode, round_money};

/// A line in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub sku: String,
    pub title: String,
    pub quantity: u32,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl CartItem {
    /// Unit price times quantity, rounded to cents.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        round_money(self.price * Decimal::from(self.quantity))
    }
}

/// A user's cart as held by the cart service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: UserId,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl Cart {
    /// An empty cart for the given user.
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            total: Decimal::ZERO,
            currency: CurrencyCode::default(),
        }
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Find the line for a product.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Sum of line totals. The service-reported `total` is authoritative;
    /// this is for display when the two are compared.
    #[must_use]
    pub fn computed_total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_cart() -> Cart {
        serde_json::from_value(serde_json::json!({
            "userId": 7,
            "items": [
                {"productId": 301671, "sku": "LAP-001", "title": "Laptop", "quantity": 2, "price": 499.99, "currency": "USD"},
                {"productId": 301672, "sku": "MOU-002", "title": "Mouse", "quantity": 1, "price": 19.5}
            ],
            "total": 1019.48,
            "currency": "USD"
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_cart_service_payload() {
        let cart = sample_cart();
        assert_eq!(cart.user_id, UserId::new(7));
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[1].currency, CurrencyCode::USD);
    }

    #[test]
    fn test_item_count_sums_quantities() {
        assert_eq!(sample_cart().item_count(), 3);
        assert_eq!(Cart::empty(UserId::new(1)).item_count(), 0);
    }

    #[test]
    fn test_computed_total() {
        assert_eq!(sample_cart().computed_total(), Decimal::new(101_948, 2));
    }

    #[test]
    fn test_line_lookup() {
        let cart = sample_cart();
        assert_eq!(cart.line(ProductId::new(301_672)).unwrap().sku, "MOU-002");
        assert!(cart.line(ProductId::new(1)).is_none());
    }
}
