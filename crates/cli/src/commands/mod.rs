//! CLI subcommand implementations.

pub mod migrate;
pub mod products;
pub mod seed;
