//! Command implementations for the shopsdb CLI

pub mod admin;
pub mod products;
pub mod shops;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use shopsdb_core::{CatalogError, Envelope};

/// Lookup by surrogate id or by slug
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Numeric id
    #[arg(required_unless_present = "slug", conflicts_with = "slug")]
    pub id: Option<i64>,

    /// Look up by slug instead of id
    #[arg(long)]
    pub slug: Option<String>,
}

/// Which key a [`LookupArgs`] selected
pub enum Lookup<'a> {
    Id(i64),
    Slug(&'a str),
}

impl LookupArgs {
    pub fn key(&self) -> Lookup<'_> {
        match &self.slug {
            Some(slug) => Lookup::Slug(slug),
            // clap requires the id whenever no slug is given
            None => Lookup::Id(self.id.unwrap_or_default()),
        }
    }
}

/// Print an operation outcome as a JSON envelope.
///
/// Returns `false` when the envelope carries an error.
pub fn print<T: Serialize>(result: Result<T, CatalogError>) -> Result<bool> {
    let envelope = Envelope::from(result);
    let ok = !envelope.is_error();
    let json = serde_json::to_string_pretty(&envelope).context("Failed to serialize envelope")?;
    println!("{json}");
    Ok(ok)
}
