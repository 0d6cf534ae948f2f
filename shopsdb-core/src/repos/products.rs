//! Product repository
//!
//! Handles product reads plus the batched insert:
//! - lookups by id/slug join the owning shop (projection: img_src, slug)
//! - bulk insert validates every row, then writes all rows in one transaction

use sqlx::any::AnyRow;
use sqlx::{AnyPool, FromRow, Row};
use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::model::{validate_batch, Entity, NewProduct, Product, ProductWithShop, Shop, ShopSummary};

/// Prefix for joined shop columns, keeping them apart from product columns
const SHOP_PREFIX: &str = "shop_";

/// Product repository
pub struct ProductRepo<'a> {
    pool: &'a AnyPool,
}

impl<'a> ProductRepo<'a> {
    pub fn new(pool: &'a AnyPool) -> Self {
        Self { pool }
    }

    /// List every product in key order.
    pub async fn list(&self) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM {} p ORDER BY p.id",
            Product::select_list("p"),
            Product::TABLE
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(self.pool)
            .await?;

        debug!(count = products.len(), "listed products");
        Ok(products)
    }

    /// List the products owned by one shop.
    pub async fn list_for_shop(&self, shop_id: i64) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM {} p WHERE p.{} = ? ORDER BY p.id",
            Product::select_list("p"),
            Product::TABLE,
            Shop::PRODUCTS.foreign_key,
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(shop_id)
            .fetch_all(self.pool)
            .await?;

        debug!(shop_id, count = products.len(), "listed products for shop");
        Ok(products)
    }

    /// Get a product by id, with its shop projection.
    pub async fn get(&self, id: i64) -> Result<ProductWithShop> {
        let row = sqlx::query(&joined_lookup_sql("id"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| CatalogError::not_found("product", id))?;

        product_with_shop(&row)
    }

    /// Get a product by slug, with its shop projection.
    pub async fn get_by_slug(&self, slug: &str) -> Result<ProductWithShop> {
        let row = sqlx::query(&joined_lookup_sql("slug"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| CatalogError::not_found("product", slug))?;

        product_with_shop(&row)
    }

    /// Validate and insert a batch of products atomically.
    ///
    /// Returns the stored records with their generated ids, in input order.
    /// Any validation failure rejects the whole batch before touching the
    /// database; a storage failure rolls the transaction back.
    pub async fn bulk_insert(&self, rows: Vec<NewProduct>) -> Result<Vec<Product>> {
        let violations = validate_batch(&rows);
        if !violations.is_empty() {
            return Err(CatalogError::Validation(violations));
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let columns = Product::insert_columns();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            Product::TABLE,
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(rows.len());

        for row in rows {
            let result = sqlx::query(&sql)
                .bind(row.img_src.as_deref())
                .bind(row.name.as_str())
                .bind(row.slug.as_str())
                .bind(row.price)
                .bind(row.old_price)
                .bind(row.description.as_deref())
                .bind(row.shop_id)
                .bind(row.category_id)
                .execute(&mut *tx)
                .await?;

            let id = result.last_insert_id().ok_or_else(|| {
                CatalogError::Database(sqlx::Error::Protocol(
                    "driver reported no generated id".into(),
                ))
            })?;
            inserted.push(row.into_product(id));
        }

        tx.commit().await?;
        info!(count = inserted.len(), "bulk inserted products");
        Ok(inserted)
    }
}

/// Single product joined with its shop, keyed by `key_column`.
///
/// Ordered by the shop's img_src so a fanned-out join still yields a
/// deterministic first row.
fn joined_lookup_sql(key_column: &str) -> String {
    let shop_columns = ShopSummary::COLUMNS
        .iter()
        .map(|col| format!("s.{col} AS {SHOP_PREFIX}{col}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT {}, {} FROM {} p {} WHERE p.{} = ? ORDER BY s.img_src LIMIT 1",
        Product::select_list("p"),
        shop_columns,
        Product::TABLE,
        Product::SHOP.left_join("p", "s"),
        key_column,
    )
}

fn product_with_shop(row: &AnyRow) -> Result<ProductWithShop> {
    let product = Product::from_row(row)?;

    // The join is outer: a dangling shop_id yields NULL shop columns.
    let shop_slug: Option<String> = row.try_get(format!("{SHOP_PREFIX}slug").as_str())?;
    let shop = match shop_slug {
        Some(slug) => Some(ShopSummary {
            img_src: row.try_get(format!("{SHOP_PREFIX}img_src").as_str())?,
            slug,
        }),
        None => None,
    };

    Ok(ProductWithShop { product, shop })
}
