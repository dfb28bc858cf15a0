//! TechMart catalog service library.
//!
//! The product catalog and its deals as a library so the router can be
//! driven in-process by tests and reused by tooling (the CLI's seed command).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod search;
pub mod services;
pub mod state;
pub mod store;
