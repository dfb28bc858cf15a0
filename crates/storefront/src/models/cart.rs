//! Cart service responses beyond the cart itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use techmart_core::CurrencyCode;

/// `GET /cart/summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub item_count: u32,
    pub total: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub user_email: Option<String>,
}

/// `GET /cart/validate`. Invalid carts still answer 200 with a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartValidation {
    pub valid: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub item_count: Option<u32>,
    #[serde(default)]
    pub total: Option<Decimal>,
}
