//! Shop repository
//!
//! Read-only lookups over `shops`. Single-row lookups report
//! `CatalogError::NotFound`; listings return an empty vec instead.

use sqlx::AnyPool;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::model::{Entity, Shop};

/// Shop repository
pub struct ShopRepo<'a> {
    pool: &'a AnyPool,
}

impl<'a> ShopRepo<'a> {
    pub fn new(pool: &'a AnyPool) -> Self {
        Self { pool }
    }

    /// List every shop in key order.
    pub async fn list(&self) -> Result<Vec<Shop>> {
        let sql = format!(
            "SELECT {} FROM {} s ORDER BY s.id",
            Shop::select_list("s"),
            Shop::TABLE
        );
        let shops = sqlx::query_as::<_, Shop>(&sql).fetch_all(self.pool).await?;

        debug!(count = shops.len(), "listed shops");
        Ok(shops)
    }

    /// Get a single shop by id.
    pub async fn get(&self, id: i64) -> Result<Shop> {
        let sql = format!(
            "SELECT {} FROM {} s WHERE s.id = ?",
            Shop::select_list("s"),
            Shop::TABLE
        );
        sqlx::query_as::<_, Shop>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| CatalogError::not_found("shop", id))
    }

    /// Get a single shop by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Shop> {
        let sql = format!(
            "SELECT {} FROM {} s WHERE s.slug = ? ORDER BY s.id LIMIT 1",
            Shop::select_list("s"),
            Shop::TABLE
        );
        sqlx::query_as::<_, Shop>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| CatalogError::not_found("shop", slug))
    }
}
