//! shopsdb-core: data-access layer for the online shops catalog
//!
//! Read operations over shops and their products, plus the administrative
//! schema lifecycle (create, seed, drop) and a validated product batch
//! insert.
//!
//! ```ignore
//! let config = CatalogConfig::load("config.toml")?.with_env_overrides();
//! let catalog = Catalog::connect(&config)?;
//!
//! catalog.create_schema().await?;
//! let widget = catalog.get_product_by_slug("widget").await?;
//! ```
//!
//! `Catalog` must be built inside a tokio runtime; its pools spawn
//! maintenance tasks.

pub mod admin;
pub mod catalog;
pub mod config;
pub mod envelope;
pub mod error;
pub mod model;
pub mod pool;
pub mod repos;
pub mod scripts;

pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use envelope::{spawn_with_callback, Envelope, ErrorBody, ViolationDetail};
pub use error::{CatalogError, Result};
pub use model::{NewProduct, Product, ProductWithShop, Shop, ShopSummary};
pub use pool::Dialect;
pub use scripts::Scripts;
