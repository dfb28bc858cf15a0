//! TechMart storefront client library.
//!
//! Typed clients for the product catalog, cart, order, user and search
//! services, plus the client-side session state (logged-in user and cart)
//! that a storefront UI binds to.
//!
//! ```no_run
//! # async fn demo() -> Result<(), techmart_storefront::ApiError> {
//! use techmart_storefront::{StorefrontApi, StorefrontConfig};
//! use techmart_storefront::models::ProductFilter;
//!
//! let api = StorefrontApi::new(&StorefrontConfig::default())?;
//! let products = api.products.list(&ProductFilter::default()).await?;
//! # let _ = products;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod session;

pub use api::StorefrontApi;
pub use config::StorefrontConfig;
pub use error::ApiError;
pub use session::{AuthSession, CartSession, CartState};
