//! Order service request and response shapes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use techmart_core::{
    Cart, CartItem, CurrencyCode, OrderId, OrderStatus, OrderTotals, PaymentStatus,
    ShippingAddress, UserId,
};

/// Body of `POST /orders/`: the cart contents plus optional checkout details.
///
/// The user is taken from the bearer token, never from the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub currency: CurrencyCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewOrder {
    /// Build an order request from a cart snapshot.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            items: cart.items.clone(),
            total: cart.total,
            currency: cart.currency,
            shipping_address: None,
            customer_email: None,
            customer_phone: None,
            notes: None,
        }
    }

    /// What the order service should charge for these items once it has
    /// applied `discount`.
    #[must_use]
    pub fn quote(&self, discount: Decimal) -> OrderTotals {
        OrderTotals::for_lines(
            self.items.iter().map(|item| (item.price, item.quantity)),
            discount,
        )
    }

    #[must_use]
    pub fn with_shipping(mut self, address: ShippingAddress) -> Self {
        self.shipping_address = Some(address);
        self
    }

    #[must_use]
    pub fn with_contact(mut self, email: impl Into<String>, phone: Option<String>) -> Self {
        self.customer_email = Some(email.into());
        self.customer_phone = phone;
        self
    }
}

/// One row of an order listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Admin status update. Unset fields are left untouched by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.payment_status.is_none()
            && self.tracking_number.is_none()
            && self.notes.is_none()
    }
}

/// Aggregates from `GET /orders/admin/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub confirmed_orders: i64,
    pub processing_orders: i64,
    pub shipped_orders: i64,
    pub delivered_orders: i64,
    pub cancelled_orders: i64,
    pub total_revenue: Decimal,
    pub orders_today: i64,
    pub orders_this_month: i64,
}

/// Page selection for order listings (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Page {
    /// Default page for a customer's own orders.
    pub const MINE: Self = Self { page: 1, size: 10 };
    /// Default page for the admin listing.
    pub const ADMIN: Self = Self { page: 1, size: 20 };

    #[must_use]
    pub const fn new(page: u32, size: u32) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            size: if size == 0 { 1 } else { size },
        }
    }
}
