//! Database connection pool management
//!
//! Uses the sqlx `Any` driver so the same catalog runs against MySQL in
//! production and SQLite for local work and tests. The dialect is picked
//! from the URL scheme.

use std::time::Duration;

use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;

use crate::config::PoolConfig;
use crate::error::{CatalogError, Result};

/// SQL dialect behind a connection URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(CatalogError::config(format!(
                "unsupported database scheme '{other}' (expected mysql or sqlite)"
            ))),
        }
    }

    /// Statement disabling foreign-key enforcement for the session
    pub fn disable_foreign_keys(self) -> &'static str {
        match self {
            Self::MySql => "SET FOREIGN_KEY_CHECKS=0",
            Self::Sqlite => "PRAGMA foreign_keys = OFF",
        }
    }

    /// Statement restoring foreign-key enforcement for the session
    pub fn enable_foreign_keys(self) -> &'static str {
        match self {
            Self::MySql => "SET FOREIGN_KEY_CHECKS=1",
            Self::Sqlite => "PRAGMA foreign_keys = ON",
        }
    }

    /// Script dropping both catalog tables with constraint checks disabled.
    ///
    /// MySQL qualifies the tables with the database name and drops them in
    /// one statement; SQLite has no multi-table DROP.
    pub fn drop_tables_script(self, database: &str, tables: &[&str]) -> String {
        match self {
            Self::MySql => {
                let qualified = tables
                    .iter()
                    .map(|t| format!("{database}.{t}"))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}; DROP TABLE {}", self.disable_foreign_keys(), qualified)
            }
            Self::Sqlite => {
                let drops: String = tables.iter().map(|t| format!(" DROP TABLE {t};")).collect();
                format!("{};{}", self.disable_foreign_keys(), drops)
            }
        }
    }
}

/// Create a connection pool.
///
/// The pool is lazy: no connection is opened until the first acquire, so
/// connectivity problems surface from the operation that needed them.
pub fn create_pool(url: &str, options: &PoolConfig) -> Result<AnyPool> {
    install_default_drivers();

    AnyPoolOptions::new()
        .max_connections(options.max_connections)
        .min_connections(options.min_connections)
        .idle_timeout(Duration::from_secs(options.idle_timeout_secs))
        .acquire_timeout(Duration::from_secs(options.acquire_timeout_secs))
        .connect_lazy(url)
        .map_err(CatalogError::from)
}
