//! Schema lifecycle operations
//!
//! Create, seed and drop run multi-statement scripts on a connection
//! borrowed from the admin pool. The `PoolConnection` goes back to the pool
//! when it drops, so every exit path releases it; a failed acquire never
//! held one.

use std::time::{Duration, Instant};

use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool, Connection, Executor};
use tracing::{error, info, warn};

use crate::error::{CatalogError, Result};
use crate::model::{Entity, Product, Shop};
use crate::pool::Dialect;
use crate::scripts::Scripts;

pub const SCHEMA_CREATED: &str = "Tables has been created!";
pub const DATA_CREATED: &str = "Tables data has been created!";
pub const SCHEMA_REMOVED: &str = "Tables has been removed!";

/// Administrative operations bound to the admin pool
pub struct AdminOps<'a> {
    pool: &'a AnyPool,
    dialect: Dialect,
    database: &'a str,
    scripts: &'a Scripts,
    /// Budget for `drop_schema`, which applies its own timeout
    timeout: Duration,
}

impl<'a> AdminOps<'a> {
    pub fn new(
        pool: &'a AnyPool,
        dialect: Dialect,
        database: &'a str,
        scripts: &'a Scripts,
        timeout: Duration,
    ) -> Self {
        Self {
            pool,
            dialect,
            database,
            scripts,
            timeout,
        }
    }

    /// Run the schema script creating `shops` and `products`.
    pub async fn create_schema(&self) -> Result<&'static str> {
        let mut conn = self.acquire().await?;
        (&mut *conn).execute(sqlx::raw_sql(self.scripts.schema())).await?;

        info!("Catalog schema created");
        Ok(SCHEMA_CREATED)
    }

    /// Run the seed script.
    ///
    /// A unique-key collision (seeding twice) is reported as
    /// [`CatalogError::Duplicated`] instead of the raw storage error.
    pub async fn seed_data(&self) -> Result<&'static str> {
        let mut conn = self.acquire().await?;
        match (&mut *conn).execute(sqlx::raw_sql(self.scripts.seed())).await {
            Ok(_) => {
                info!("Catalog seed data inserted");
                Ok(DATA_CREATED)
            }
            Err(e) => {
                let err = CatalogError::from(e);
                if err.is_unique_violation() {
                    warn!("Seed rejected, data already present: {}", err);
                    Err(CatalogError::Duplicated)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Drop both tables with foreign-key checks disabled for the session.
    ///
    /// The check setting is restored before the connection returns to the
    /// pool, whether the drop succeeded, failed or timed out. Only the
    /// acquire and the drop count against the timeout.
    pub async fn drop_schema(&self) -> Result<&'static str> {
        let started = Instant::now();
        let mut conn = tokio::time::timeout(self.timeout, self.acquire())
            .await
            .map_err(|_| self.timed_out())??;

        let script = self
            .dialect
            .drop_tables_script(self.database, &[Product::TABLE, Shop::TABLE]);
        let remaining = self.timeout.saturating_sub(started.elapsed());

        let dropped = tokio::time::timeout(remaining, (&mut *conn).execute(sqlx::raw_sql(&script)))
            .await
            .map_err(|_| self.timed_out())
            .and_then(|result| result.map_err(CatalogError::from));
        self.restore_foreign_keys(conn).await;
        dropped?;

        info!("Catalog schema removed");
        Ok(SCHEMA_REMOVED)
    }

    async fn acquire(&self) -> Result<PoolConnection<Any>> {
        self.pool.acquire().await.map_err(|e| {
            error!("Failed to acquire admin connection: {}", e);
            CatalogError::Acquire(e)
        })
    }

    fn timed_out(&self) -> CatalogError {
        warn!(operation = "drop_schema", "catalog operation timed out");
        CatalogError::Timeout {
            operation: "drop_schema",
            after: self.timeout,
        }
    }

    async fn restore_foreign_keys(&self, mut conn: PoolConnection<Any>) {
        let restore = self.dialect.enable_foreign_keys();
        let outcome =
            tokio::time::timeout(self.timeout, (&mut *conn).execute(sqlx::raw_sql(restore))).await;

        // Never hand a connection with checks disabled back to the pool.
        match outcome {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!("Failed to restore foreign key checks, discarding connection: {}", e);
                if let Err(e) = conn.detach().close().await {
                    warn!("Error closing discarded connection: {}", e);
                }
            }
            Err(_) => {
                // The connection is still busy with the interrupted drop.
                error!("Timed out restoring foreign key checks, discarding connection");
                drop(conn.detach());
            }
        }
    }
}
