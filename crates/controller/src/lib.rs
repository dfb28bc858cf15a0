//! TechMart multi-cloud controller library.
//!
//! Watches the platforms hosting TechMart (Vercel, Heroku, Render), syncs
//! them on a fixed interval with per-platform retry, and serves their
//! status over HTTP.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod platform;
pub mod routes;
pub mod scheduler;
pub mod state;
