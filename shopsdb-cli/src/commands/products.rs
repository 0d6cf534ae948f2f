//! Product lookups

use anyhow::Result;
use clap::Args;
use shopsdb_core::Catalog;

use super::{print, Lookup, LookupArgs};

#[derive(Args, Debug)]
pub struct ProductsArgs {
    /// Only products owned by this shop id
    #[arg(long)]
    pub shop: Option<i64>,
}

pub async fn run_products(catalog: &Catalog, args: ProductsArgs) -> Result<bool> {
    match args.shop {
        Some(shop_id) => print(catalog.list_products_by_shop(shop_id).await),
        None => print(catalog.list_products().await),
    }
}

pub async fn run_product(catalog: &Catalog, args: LookupArgs) -> Result<bool> {
    match args.key() {
        Lookup::Id(id) => print(catalog.get_product_by_id(id).await),
        Lookup::Slug(slug) => print(catalog.get_product_by_slug(slug).await),
    }
}
