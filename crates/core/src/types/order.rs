//! Order shapes returned by the order service, and totals arithmetic.
//!
//! The order service speaks snake_case JSON.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, OrderItemId, ProductId, UserId};
use super::price::round_money;
use super::status::{OrderStatus, PaymentStatus};

/// Tax applied to the subtotal, as a fraction.
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Orders with a subtotal at or above this amount ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Flat shipping fee below the free-shipping threshold.
pub const FLAT_SHIPPING: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Money breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals from a subtotal and discount.
    ///
    /// Tax is 10% of the subtotal; shipping is a flat 10.00 below a subtotal
    /// of 100.00 and free from there on.
    #[must_use]
    pub fn compute(subtotal: Decimal, discount: Decimal) -> Self {
        let subtotal = round_money(subtotal);
        let tax = round_money(subtotal * TAX_RATE);
        let shipping = if subtotal < FREE_SHIPPING_THRESHOLD {
            FLAT_SHIPPING
        } else {
            Decimal::ZERO
        };
        let discount = round_money(discount);
        Self {
            subtotal,
            tax,
            shipping,
            discount,
            total: round_money(subtotal + tax + shipping - discount),
        }
    }

    /// Compute totals for a set of `(unit_price, quantity)` lines.
    #[must_use]
    pub fn for_lines<I>(lines: I, discount: Decimal) -> Self
    where
        I: IntoIterator<Item = (Decimal, u32)>,
    {
        let subtotal = lines
            .into_iter()
            .map(|(unit, quantity)| unit * Decimal::from(quantity))
            .sum();
        Self::compute(subtotal, discount)
    }
}

/// Postal address an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub product_sku: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total_price: Decimal,
}

/// An order as returned by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Human-facing number, `ORD-YYYYMMDD-XXXXXXXX`.
    pub order_number: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub shipping_city: String,
    #[serde(default)]
    pub shipping_state: Option<String>,
    #[serde(default)]
    pub shipping_postal_code: Option<String>,
    #[serde(default)]
    pub shipping_country: Option<String>,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

impl Order {
    /// The money breakdown as reported by the service.
    #[must_use]
    pub const fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            tax: self.tax_amount,
            shipping: self.shipping_amount,
            discount: self.discount_amount,
            total: self.total_amount,
        }
    }

    /// Whether `order_number` has the `ORD-YYYYMMDD-XXXXXXXX` shape.
    #[must_use]
    pub fn has_well_formed_number(&self) -> bool {
        is_order_number(&self.order_number)
    }
}

/// Check the `ORD-YYYYMMDD-XXXXXXXX` shape: an eight-digit date and an
/// eight-character upper-case alphanumeric suffix.
#[must_use]
pub fn is_order_number(s: &str) -> bool {
    let mut parts = s.split('-');
    let (Some("ORD"), Some(date), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && chrono::NaiveDate::parse_from_str(date, "%Y%m%d").is_ok()
        && suffix.len() == 8
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_below_free_shipping() {
        let totals = OrderTotals::compute(Decimal::from(50), Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::from(5));
        assert_eq!(totals.shipping, Decimal::from(10));
        assert_eq!(totals.total, Decimal::from(65));
    }

    #[test]
    fn test_totals_at_free_shipping_threshold() {
        let totals = OrderTotals::compute(Decimal::from(100), Decimal::ZERO);
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::from(110));
    }

    #[test]
    fn test_totals_with_discount_and_lines() {
        let lines = [(Decimal::new(1999, 2), 2), (Decimal::new(500, 2), 1)];
        let totals = OrderTotals::for_lines(lines, Decimal::from(3));
        assert_eq!(totals.subtotal, Decimal::new(4498, 2));
        assert_eq!(totals.tax, Decimal::new(450, 2));
        // 44.98 + 4.50 + 10 - 3
        assert_eq!(totals.total, Decimal::new(5648, 2));
    }

    #[test]
    fn test_order_number_shape() {
        assert!(is_order_number("ORD-20250715-A1B2C3D4"));
        assert!(!is_order_number("ORD-20251345-A1B2C3D4"));
        assert!(!is_order_number("ORD-20250715-a1b2c3d4"));
        assert!(!is_order_number("ORD-20250715-A1B2"));
        assert!(!is_order_number("INV-20250715-A1B2C3D4"));
    }

    #[test]
    fn test_deserialize_order_service_payload() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 12,
            "user_id": 7,
            "order_number": "ORD-20250715-0000FFFF",
            "status": "shipped",
            "payment_status": "paid",
            "subtotal": 50.0,
            "tax_amount": 5.0,
            "shipping_amount": 10.0,
            "total_amount": 65.0,
            "shipping_address": "1 Main St",
            "shipping_city": "Springfield",
            "customer_email": "ada@techmart.io",
            "tracking_number": "1Z999",
            "created_at": "2025-07-15T10:00:00Z",
            "updated_at": "2025-07-15T11:00:00Z",
            "order_items": [{
                "id": 1,
                "product_id": 301671,
                "product_name": "Laptop",
                "product_sku": "LAP-001",
                "unit_price": 25.0,
                "quantity": 2,
                "total_price": 50.0
            }]
        }))
        .unwrap();

        assert_eq!(order.status, OrderStatus::Shipped);
        assert!(order.has_well_formed_number());
        assert_eq!(order.totals(), OrderTotals::compute(Decimal::from(50), Decimal::ZERO));
        assert_eq!(order.order_items[0].product_id, ProductId::new(301_671));
    }

    #[test]
    fn test_deserialize_decimal_strings() {
        let item: OrderItem = serde_json::from_value(serde_json::json!({
            "id": 3,
            "product_id": 301672,
            "product_name": "Mouse",
            "unit_price": "12.50",
            "quantity": 2,
            "total_price": "25.00"
        }))
        .unwrap();
        assert_eq!(item.unit_price, Decimal::new(1250, 2));
        assert_eq!(item.total_price, Decimal::new(25, 0));
        assert!(item.product_sku.is_none());
    }
}
