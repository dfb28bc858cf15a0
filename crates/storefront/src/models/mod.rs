//! Request and response shapes of the services the storefront calls.
//!
//! Shared domain types (carts, orders, ids) live in `techmart-core`; this
//! module holds the shapes only the storefront needs.

pub mod cart;
pub mod deal;
pub mod order;
pub mod product;
pub mod search;
pub mod user;

pub use cart::{CartSummary, CartValidation};
pub use deal::{Deal, DealFilter};
pub use order::{NewOrder, OrderStats, OrderSummary, OrderUpdate, Page};
pub use product::{Product, ProductFilter};
pub use search::{SearchHit, SearchResponse, SearchResults};
pub use user::{Credentials, Registration, User};
