//! Business logic services.

pub mod catalog;
pub mod deals;

pub use catalog::{CatalogError, CatalogService, ListFilter, parse_product_id};
pub use deals::{DealFilter, DealService, parse_deal_id};
