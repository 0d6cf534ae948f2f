//! Product import

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use shopsdb_core::{Catalog, NewProduct};
use tracing::info;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON file holding an array of product records
    pub file: PathBuf,
}

pub async fn run_import(catalog: &Catalog, args: ImportArgs) -> Result<bool> {
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let rows: Vec<NewProduct> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of products", args.file.display()))?;

    info!(count = rows.len(), file = %args.file.display(), "Importing products");
    super::print(catalog.bulk_insert_products(rows).await)
}
