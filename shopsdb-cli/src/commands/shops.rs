//! Shop lookups

use anyhow::Result;
use shopsdb_core::Catalog;

use super::{print, Lookup, LookupArgs};

pub async fn run_shop(catalog: &Catalog, args: LookupArgs) -> Result<bool> {
    match args.key() {
        Lookup::Id(id) => print(catalog.get_shop_by_id(id).await),
        Lookup::Slug(slug) => print(catalog.get_shop_by_slug(slug).await),
    }
}
