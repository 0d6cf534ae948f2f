//! Entity model for the catalog
//!
//! Declares the `shops` and `products` tables, their column sets and the
//! one-to-many relation between them. Repositories build their SQL from
//! these declarations instead of repeating column lists. Rows carry no
//! audit timestamps.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{RowViolation, ValidationError};

/// A mapped table
pub trait Entity {
    /// Table name
    const TABLE: &'static str;

    /// Column names, surrogate key first
    const COLUMNS: &'static [&'static str];

    /// Columns written on insert (everything except the generated key)
    fn insert_columns() -> &'static [&'static str] {
        &Self::COLUMNS[1..]
    }

    /// `alias.col AS col, ...` for use in a SELECT list
    fn select_list(alias: &str) -> String {
        Self::COLUMNS
            .iter()
            .map(|col| format!("{alias}.{col} AS {col}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Relation cardinality as seen from the declaring side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    BelongsTo,
    HasMany,
}

/// Foreign-key relation between two tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub from: &'static str,
    pub to: &'static str,
    pub foreign_key: &'static str,
    pub cardinality: Cardinality,
}

impl Relation {
    /// LEFT JOIN clause resolving this relation from `from_alias` to `to_alias`.
    pub fn left_join(&self, from_alias: &str, to_alias: &str) -> String {
        match self.cardinality {
            Cardinality::BelongsTo => format!(
                "LEFT JOIN {to} {to_alias} ON {to_alias}.id = {from_alias}.{fk}",
                to = self.to,
                fk = self.foreign_key,
            ),
            Cardinality::HasMany => format!(
                "LEFT JOIN {to} {to_alias} ON {to_alias}.{fk} = {from_alias}.id",
                to = self.to,
                fk = self.foreign_key,
            ),
        }
    }
}

// ============================================================================
// Shop
// ============================================================================

/// Shop record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Shop {
    pub id: i64,
    pub img_src: Option<String>,
    pub name: String,
    pub slug: String,
    /// Declared as an integer column by the catalog schema.
    pub description: Option<i64>,
}

impl Entity for Shop {
    const TABLE: &'static str = "shops";
    const COLUMNS: &'static [&'static str] = &["id", "img_src", "name", "slug", "description"];
}

impl Shop {
    /// A shop owns its products through `products.shop_id`.
    pub const PRODUCTS: Relation = Relation {
        from: Shop::TABLE,
        to: Product::TABLE,
        foreign_key: "shop_id",
        cardinality: Cardinality::HasMany,
    };
}

/// Restricted shop projection embedded in product lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSummary {
    pub img_src: Option<String>,
    pub slug: String,
}

impl ShopSummary {
    pub const COLUMNS: &'static [&'static str] = &["img_src", "slug"];
}

// ============================================================================
// Product
// ============================================================================

/// Product record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub img_src: Option<String>,
    pub name: String,
    pub slug: String,
    pub price: i64,
    /// Previous price, shown for discounts
    pub old_price: Option<i64>,
    pub description: Option<String>,
    pub shop_id: i64,
    pub category_id: Option<i64>,
}

impl Entity for Product {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "img_src",
        "name",
        "slug",
        "price",
        "old_price",
        "description",
        "shop_id",
        "category_id",
    ];
}

impl Product {
    /// Every product belongs to exactly one shop.
    pub const SHOP: Relation = Relation {
        from: Product::TABLE,
        to: Shop::TABLE,
        foreign_key: "shop_id",
        cardinality: Cardinality::BelongsTo,
    };
}

/// Product joined with the projection of its owning shop.
///
/// `shop` is `None` when the referenced shop row is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductWithShop {
    #[serde(flatten)]
    pub product: Product,
    pub shop: Option<ShopSummary>,
}

/// Product insert shape, as submitted to bulk insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub img_src: Option<String>,
    pub name: String,
    pub slug: String,
    pub price: i64,
    #[serde(default)]
    pub old_price: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    pub shop_id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
}

impl NewProduct {
    /// Check field rules, returning every violation found.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::Empty { field: "name" });
        }
        if self.slug.trim().is_empty() {
            errors.push(ValidationError::Empty { field: "slug" });
        }
        if self.price < 0 {
            errors.push(ValidationError::OutOfRange {
                field: "price",
                min: 0,
                value: self.price,
            });
        }
        if let Some(old_price) = self.old_price.filter(|p| *p < 0) {
            errors.push(ValidationError::OutOfRange {
                field: "old_price",
                min: 0,
                value: old_price,
            });
        }
        if self.shop_id < 1 {
            errors.push(ValidationError::OutOfRange {
                field: "shop_id",
                min: 1,
                value: self.shop_id,
            });
        }

        errors
    }

    /// Attach the generated key, producing the stored record.
    pub fn into_product(self, id: i64) -> Product {
        Product {
            id,
            img_src: self.img_src,
            name: self.name,
            slug: self.slug,
            price: self.price,
            old_price: self.old_price,
            description: self.description,
            shop_id: self.shop_id,
            category_id: self.category_id,
        }
    }
}

/// Validate a whole batch, tagging each violation with its row index.
pub fn validate_batch(rows: &[NewProduct]) -> Vec<RowViolation> {
    rows.iter()
        .enumerate()
        .flat_map(|(row, product)| {
            product
                .validate()
                .into_iter()
                .map(move |error| RowViolation { row, error })
        })
        .collect()
}
