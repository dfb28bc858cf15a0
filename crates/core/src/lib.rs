//! TechMart Core - Shared domain types.
//!
//! This crate provides the types shared by every TechMart component:
//! - `catalog` - Product catalog HTTP service
//! - `storefront` - API clients and client-side session state
//! - `controller` - Multi-cloud deployment controller
//! - `cli` - Migrations, seeding and catalog queries
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain arithmetic - no I/O,
//! no database access, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, SKUs, emails, prices, statuses, carts and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
