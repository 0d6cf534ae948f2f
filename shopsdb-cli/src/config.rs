//! Config discovery for the CLI
//!
//! Priority: `--config PATH` > `~/.shopsdb/config.toml` > built-in defaults.
//! `SHOPSDB_DATABASE_URL` / `DATABASE_URL` override the URL from any of them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shopsdb_core::CatalogConfig;
use tracing::{debug, info};

/// Get the shopsdb config directory path (~/.shopsdb)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".shopsdb"))
}

/// Resolve the effective catalog config.
pub fn load(explicit: Option<&Path>) -> Result<CatalogConfig> {
    let config = match explicit {
        Some(path) => CatalogConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match config_dir().map(|dir| dir.join("config.toml")) {
            Some(path) if path.exists() => CatalogConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            _ => {
                info!("No config file found, using defaults");
                CatalogConfig::default()
            }
        },
    };

    debug!(url_from_config = config.url.is_some(), "Resolved catalog config");
    Ok(config.with_env_overrides())
}
