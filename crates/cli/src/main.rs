//! TechMart CLI - database migrations, seeding and catalog queries.
//!
//! # Usage
//!
//! ```bash
//! # Create the catalog schema
//! techmart migrate catalog
//!
//! # Replace the catalog with the products in a seed file
//! techmart seed products --file data/products.json
//!
//! # Validate a seed file without touching the database
//! techmart seed products --file data/products.yaml --dry-run
//!
//! # Replace every deal
//! techmart seed deals --file data/deals.json
//!
//! # Query a running catalog service
//! techmart products list --department Electronics --limit 5
//! techmart products get 301671
//! techmart products search keyboard
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use techmart_core::ProductId;

mod commands;

#[derive(Parser)]
#[command(name = "techmart")]
#[command(author, version, about = "TechMart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Load seed data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Query the catalog service (`PRODUCTS_URL_BASE`)
    Products {
        #[command(subcommand)]
        query: ProductQuery,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run catalog database migrations
    Catalog,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Replace the catalog with the products in a JSON or YAML file
    Products {
        /// Path to the seed file
        #[arg(short, long)]
        file: String,

        /// Validate only; do not write to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Replace every deal with the deals in a JSON or YAML file
    Deals {
        #[arg(short, long)]
        file: String,

        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum ProductQuery {
    /// List active products
    List {
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        department: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        brand: Option<String>,
        #[arg(long)]
        min_price: Option<Decimal>,
        #[arg(long)]
        max_price: Option<Decimal>,
    },
    /// Show one product by id
    Get { id: ProductId },
    /// Show one product by SKU
    Sku { sku: String },
    /// Full-text search over title, description and brand
    Search {
        term: String,
        #[arg(short, long)]
        limit: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // `.env` supplies database and service URLs for every subcommand
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "techmart_cli=info,techmart_catalog=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Catalog => commands::migrate::catalog().await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { file, dry_run } => {
                commands::seed::products(&file, dry_run).await?;
            }
            SeedTarget::Deals { file, dry_run } => {
                commands::seed::deals(&file, dry_run).await?;
            }
        },
        Commands::Products { query } => match query {
            ProductQuery::List {
                limit,
                search,
                department,
                category,
                brand,
                min_price,
                max_price,
            } => {
                commands::products::list(commands::products::ListArgs {
                    limit,
                    search,
                    department,
                    category,
                    brand,
                    min_price,
                    max_price,
                })
                .await?;
            }
            ProductQuery::Get { id } => commands::products::get(id).await?,
            ProductQuery::Sku { sku } => commands::products::by_sku(&sku).await?,
            ProductQuery::Search { term, limit } => {
                commands::products::search(&term, limit).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
