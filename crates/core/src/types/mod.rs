//! Core types for TechMart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod sku;
pub mod status;

pub use cart::{Cart, CartItem};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderItem, OrderTotals, ShippingAddress};
pub use price::{CurrencyCode, CurrencyError, Price, round_money};
pub use sku::{Sku, SkuError};
pub use status::*;
