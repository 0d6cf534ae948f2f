//! Catalog configuration
//!
//! Flat connection settings plus pool sizing, timeouts and the location of
//! the schema and seed scripts. Loaded from TOML; the connection URL can be
//! overridden from the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::pool::Dialect;

/// Environment variables consulted for a URL override, highest priority first.
pub const URL_ENV_VARS: &[&str] = &["SHOPSDB_DATABASE_URL", "DATABASE_URL"];

/// Connection and lifecycle settings for a [`Catalog`](crate::Catalog)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,

    /// Full connection URL; takes precedence over the discrete fields
    pub url: Option<String>,

    pub pool: PoolConfig,

    /// Upper bound on any single catalog operation
    pub query_timeout_secs: u64,

    pub scripts: ScriptPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptPaths {
    /// DDL creating the `shops` and `products` tables
    pub schema: PathBuf,
    /// DML seeding both tables
    pub seed: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "shops_online".to_string(),
            url: None,
            pool: PoolConfig::default(),
            query_timeout_secs: 30,
            scripts: ScriptPaths::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 0,
            idle_timeout_secs: 10,
            acquire_timeout_secs: 30,
        }
    }
}

impl Default for ScriptPaths {
    fn default() -> Self {
        Self {
            schema: PathBuf::from("shops_online-structure.sql"),
            seed: PathBuf::from("shops_online-data.sql"),
        }
    }
}

impl CatalogConfig {
    /// Load config from a TOML file.
    ///
    /// Relative script paths are resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            CatalogError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&raw)?;

        if let Some(base) = path.parent() {
            config.scripts.resolve_against(base);
        }

        debug!("Loaded catalog config from {}", path.display());
        Ok(config)
    }

    /// Parse config from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| CatalogError::config(e.to_string()))
    }

    /// Apply `SHOPSDB_DATABASE_URL` / `DATABASE_URL` if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = URL_ENV_VARS
            .iter()
            .find_map(|key| env::var(key).ok().filter(|v| !v.is_empty()))
        {
            debug!("Database URL overridden from environment");
            self.url = Some(url);
        }
        self
    }

    /// Connection URL for the configured database.
    ///
    /// Credentials from the discrete fields are percent-encoded.
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "mysql://{}:{}@{}:{}/{}",
                urlencoding::encode(&self.user),
                urlencoding::encode(&self.password),
                self.host,
                self.port,
                urlencoding::encode(&self.database)
            ),
        }
    }

    /// Name of the database the pools actually connect to.
    ///
    /// A MySQL `url` names its own database, and that name wins over the
    /// `database` field. Other dialects never qualify table names, so they
    /// keep the field as is.
    pub fn database_name(&self) -> Result<String> {
        let Some(url) = &self.url else {
            return Ok(self.database.clone());
        };
        if Dialect::from_url(url)? != Dialect::MySql {
            return Ok(self.database.clone());
        }

        let options = MySqlConnectOptions::from_str(url)
            .map_err(|e| CatalogError::config(format!("invalid MySQL url: {e}")))?;
        options
            .get_database()
            .map(str::to_string)
            .ok_or_else(|| CatalogError::config("MySQL url must name a database"))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool.max_connections == 0 {
            return Err(CatalogError::config("pool.max_connections must be at least 1"));
        }
        if self.pool.min_connections > self.pool.max_connections {
            return Err(CatalogError::config(
                "pool.min_connections cannot exceed pool.max_connections",
            ));
        }
        if self.query_timeout_secs == 0 {
            return Err(CatalogError::config("query_timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

impl ScriptPaths {
    fn resolve_against(&mut self, base: &Path) {
        for path in [&mut self.schema, &mut self.seed] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
