//! shopsdb CLI - schema lifecycle and catalog inspection
//!
//! Drives the shopsdb-core operations from a terminal:
//! - Schema lifecycle (`create-schema`, `seed`, `drop-schema`)
//! - Product batch import from a JSON file (`import`)
//! - Read-only lookups (`products`, `product`, `shops`, `shop`)
//!
//! Every command prints a JSON envelope on stdout and exits non-zero when
//! the envelope carries an error.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shopsdb_core::{Catalog, Scripts};
use tracing::debug;

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "shopsdb",
    author,
    version,
    about = "Manage and inspect the online shops catalog database"
)]
struct Cli {
    /// Path to a TOML config file (default: ~/.shopsdb/config.toml)
    #[arg(long, short = 'c', global = true, env = "SHOPSDB_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the shops and products tables from the schema script
    CreateSchema,
    /// Load the seed script into both tables
    Seed,
    /// Drop both tables
    DropSchema,
    /// Bulk insert products from a JSON array file
    Import(commands::admin::ImportArgs),
    /// List products, optionally for one shop
    Products(commands::products::ProductsArgs),
    /// Show one product with its shop
    Product(commands::LookupArgs),
    /// List shops
    Shops,
    /// Show one shop
    Shop(commands::LookupArgs),
}

impl Commands {
    fn runs_scripts(&self) -> bool {
        matches!(self, Self::CreateSchema | Self::Seed)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Before parsing, so `.env` can supply SHOPSDB_CONFIG.
    let dotenv = dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();
    if let Some(path) = dotenv {
        debug!("Loaded .env from {}", path.display());
    }

    let config = config::load(cli.config.as_deref())?;
    let catalog = if cli.command.runs_scripts() {
        Catalog::connect(&config)?
    } else {
        // Lookups, import and drop never read the schema or seed scripts.
        Catalog::with_scripts(&config, Scripts::new("", ""))?
    };

    let ok = match cli.command {
        Commands::CreateSchema => commands::print(catalog.create_schema().await)?,
        Commands::Seed => commands::print(catalog.seed_data().await)?,
        Commands::DropSchema => commands::print(catalog.drop_schema().await)?,
        Commands::Import(args) => commands::admin::run_import(&catalog, args).await?,
        Commands::Products(args) => commands::products::run_products(&catalog, args).await?,
        Commands::Product(args) => commands::products::run_product(&catalog, args).await?,
        Commands::Shops => commands::print(catalog.list_shops().await)?,
        Commands::Shop(args) => commands::shops::run_shop(&catalog, args).await?,
    };

    catalog.close().await;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
