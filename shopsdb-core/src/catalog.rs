//! Data-access context
//!
//! `Catalog` owns both pools, the dialect and the loaded scripts. It is
//! cheap to clone and is passed explicitly to whoever needs it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::AnyPool;
use tracing::{info, warn};

use crate::admin::AdminOps;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::model::{NewProduct, Product, ProductWithShop, Shop};
use crate::pool::{create_pool, Dialect};
use crate::repos::{ProductRepo, ShopRepo};
use crate::scripts::Scripts;

/// Shared catalog handle
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    /// Entity-model reads and the product batch insert
    query_pool: AnyPool,
    /// Script execution for schema lifecycle
    admin_pool: AnyPool,
    dialect: Dialect,
    database: String,
    scripts: Scripts,
    timeout: Duration,
}

impl Catalog {
    /// Build a catalog from config, reading both scripts from disk.
    pub fn connect(config: &CatalogConfig) -> Result<Self> {
        let scripts = Scripts::load(&config.scripts)?;
        Self::with_scripts(config, scripts)
    }

    /// Build a catalog with scripts already in memory.
    pub fn with_scripts(config: &CatalogConfig, scripts: Scripts) -> Result<Self> {
        config.validate()?;

        let url = config.connection_url();
        let dialect = Dialect::from_url(&url)?;
        let database = config.database_name()?;
        let query_pool = create_pool(&url, &config.pool)?;
        let admin_pool = create_pool(&url, &config.pool)?;

        info!(
            ?dialect,
            database = %database,
            max_connections = config.pool.max_connections,
            "Catalog ready"
        );

        Ok(Self {
            inner: Arc::new(CatalogInner {
                query_pool,
                admin_pool,
                dialect,
                database,
                scripts,
                timeout: config.query_timeout(),
            }),
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.inner.dialect
    }

    /// Database qualifying table names in dialect-specific scripts
    pub fn database(&self) -> &str {
        &self.inner.database
    }

    pub fn query_pool(&self) -> &AnyPool {
        &self.inner.query_pool
    }

    pub fn admin_pool(&self) -> &AnyPool {
        &self.inner.admin_pool
    }

    /// Close both pools, waiting for borrowed connections to return.
    pub async fn close(&self) {
        self.inner.query_pool.close().await;
        self.inner.admin_pool.close().await;
    }

    // ========================================================================
    // Products
    // ========================================================================

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.bounded("list_products", self.products().list()).await
    }

    pub async fn list_products_by_shop(&self, shop_id: i64) -> Result<Vec<Product>> {
        self.bounded("list_products_by_shop", self.products().list_for_shop(shop_id))
            .await
    }

    pub async fn get_product_by_id(&self, id: i64) -> Result<ProductWithShop> {
        self.bounded("get_product_by_id", self.products().get(id)).await
    }

    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductWithShop> {
        self.bounded("get_product_by_slug", self.products().get_by_slug(slug))
            .await
    }

    // ========================================================================
    // Shops
    // ========================================================================

    pub async fn list_shops(&self) -> Result<Vec<Shop>> {
        self.bounded("list_shops", self.shops().list()).await
    }

    pub async fn get_shop_by_id(&self, id: i64) -> Result<Shop> {
        self.bounded("get_shop_by_id", self.shops().get(id)).await
    }

    pub async fn get_shop_by_slug(&self, slug: &str) -> Result<Shop> {
        self.bounded("get_shop_by_slug", self.shops().get_by_slug(slug))
            .await
    }

    // ========================================================================
    // Administration
    // ========================================================================

    pub async fn create_schema(&self) -> Result<&'static str> {
        self.bounded("create_schema", self.admin().create_schema()).await
    }

    pub async fn seed_data(&self) -> Result<&'static str> {
        self.bounded("seed_data", self.admin().seed_data()).await
    }

    /// Bounded inside [`AdminOps::drop_schema`] so the foreign-key restore
    /// always runs, even after the drop itself times out.
    pub async fn drop_schema(&self) -> Result<&'static str> {
        self.admin().drop_schema().await
    }

    /// Validate and insert products in one batch through the entity model.
    pub async fn bulk_insert_products(&self, rows: Vec<NewProduct>) -> Result<Vec<Product>> {
        self.bounded("bulk_insert_products", self.products().bulk_insert(rows))
            .await
    }

    fn products(&self) -> ProductRepo<'_> {
        ProductRepo::new(&self.inner.query_pool)
    }

    fn shops(&self) -> ShopRepo<'_> {
        ShopRepo::new(&self.inner.query_pool)
    }

    fn admin(&self) -> AdminOps<'_> {
        AdminOps::new(
            &self.inner.admin_pool,
            self.inner.dialect,
            &self.inner.database,
            &self.inner.scripts,
            self.inner.timeout,
        )
    }

    /// Apply the configured timeout to one operation.
    ///
    /// On expiry the inner future is dropped, which returns any borrowed
    /// connection to its pool.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.inner.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, "catalog operation timed out");
                Err(CatalogError::Timeout {
                    operation,
                    after: self.inner.timeout,
                })
            }
        }
    }
}
