//! Catalog behaviour against a file-backed SQLite database
//!
//! Each test gets its own temporary database and runs the fixture scripts
//! in `tests/fixtures/` through the administrative operations.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shopsdb_core::config::{PoolConfig, ScriptPaths};
use shopsdb_core::{
    spawn_with_callback, Catalog, CatalogConfig, CatalogError, Envelope, NewProduct,
};
use tempfile::TempDir;

struct Harness {
    catalog: Catalog,
    _dir: TempDir,
}

fn fixtures() -> ScriptPaths {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    ScriptPaths {
        schema: dir.join("structure.sql"),
        seed: dir.join("data.sql"),
    }
}

fn config_for(url: String) -> CatalogConfig {
    CatalogConfig {
        url: Some(url),
        pool: PoolConfig {
            max_connections: 2,
            acquire_timeout_secs: 5,
            ..PoolConfig::default()
        },
        query_timeout_secs: 10,
        scripts: fixtures(),
        ..CatalogConfig::default()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("shopsdb_core=debug")
        .with_test_writer()
        .try_init();
}

fn empty_catalog() -> Harness {
    catalog_with(|_| {})
}

fn catalog_with(tweak: impl FnOnce(&mut CatalogConfig)) -> Harness {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("catalog.db").display());
    let mut config = config_for(url);
    tweak(&mut config);
    let catalog = Catalog::connect(&config).unwrap();
    Harness { catalog, _dir: dir }
}

async fn seeded_catalog() -> Harness {
    seed(empty_catalog()).await
}

async fn seed(harness: Harness) -> Harness {
    harness.catalog.create_schema().await.unwrap();
    harness.catalog.seed_data().await.unwrap();
    harness
}

fn new_product(slug: &str, shop_id: i64, price: i64) -> NewProduct {
    NewProduct {
        img_src: Some(format!("img/products/{slug}.png")),
        name: slug.to_uppercase(),
        slug: slug.to_string(),
        price,
        old_price: None,
        description: None,
        shop_id,
        category_id: Some(1),
    }
}

// === Query operations ===

#[tokio::test]
async fn product_by_slug_embeds_shop_projection() {
    let h = seeded_catalog().await;

    let widget = h.catalog.get_product_by_slug("widget").await.unwrap();
    assert_eq!(widget.product.id, 10);
    assert_eq!(widget.product.price, 500);
    assert_eq!(widget.product.shop_id, 1);

    let shop = widget.shop.expect("widget has a shop");
    assert_eq!(shop.slug, "acme");
    assert_eq!(shop.img_src.as_deref(), Some("img/shops/acme.png"));

    let acme = h.catalog.get_shop_by_slug("acme").await.unwrap();
    assert_eq!(acme.id, 1);
    assert_eq!(acme.name, "Acme");
}

#[tokio::test]
async fn product_by_id_serializes_only_img_src_and_slug_of_shop() {
    let h = seeded_catalog().await;

    let gadget = h.catalog.get_product_by_id(11).await.unwrap();
    assert_eq!(gadget.product.old_price, Some(1500));

    let value = serde_json::to_value(&gadget).unwrap();
    let shop = value["shop"].as_object().unwrap();
    let mut keys: Vec<_> = shop.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["img_src", "slug"]);
}

#[tokio::test]
async fn products_by_shop_never_leak_across_shops() {
    let h = seeded_catalog().await;

    for shop in h.catalog.list_shops().await.unwrap() {
        let products = h.catalog.list_products_by_shop(shop.id).await.unwrap();
        assert!(!products.is_empty());
        assert!(products.iter().all(|p| p.shop_id == shop.id));
    }

    let acme: Vec<_> = h
        .catalog
        .list_products_by_shop(1)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.slug)
        .collect();
    assert_eq!(acme, ["widget", "gadget"]);
}

#[tokio::test]
async fn lists_return_every_row() {
    let h = seeded_catalog().await;

    assert_eq!(h.catalog.list_products().await.unwrap().len(), 3);

    let shops = h.catalog.list_shops().await.unwrap();
    assert_eq!(shops.len(), 2);
    assert_eq!(shops[1].description, Some(42));
}

#[tokio::test]
async fn missing_single_entity_is_not_found() {
    let h = seeded_catalog().await;

    let err = h.catalog.get_shop_by_id(999).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { resource: "shop", .. }));

    let err = h.catalog.get_shop_by_slug("nowhere").await.unwrap_err();
    assert_eq!(err.kind(), "not_found");

    let err = h.catalog.get_product_by_slug("nothing").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { resource: "product", .. }));

    let err = h.catalog.get_product_by_id(999).await.unwrap_err();
    assert_eq!(err.to_string(), "not found: product '999'");
}

#[tokio::test]
async fn empty_listing_is_success() {
    let h = seeded_catalog().await;
    assert!(h.catalog.list_products_by_shop(999).await.unwrap().is_empty());
}

#[tokio::test]
async fn queries_without_tables_report_database_error() {
    let h = empty_catalog();
    let err = h.catalog.list_products().await.unwrap_err();
    assert_eq!(err.kind(), "database");
}

// === Bulk insert ===

#[tokio::test]
async fn bulk_insert_adds_rows_retrievable_by_id() {
    let h = seeded_catalog().await;
    let before = h.catalog.list_products().await.unwrap().len();

    let inserted = h
        .catalog
        .bulk_insert_products(vec![new_product("anvil", 1, 900), new_product("rocket", 2, 5000)])
        .await
        .unwrap();

    assert_eq!(inserted.len(), 2);
    assert_eq!(h.catalog.list_products().await.unwrap().len(), before + 2);

    for product in &inserted {
        let stored = h.catalog.get_product_by_id(product.id).await.unwrap();
        assert_eq!(&stored.product, product);
    }
    assert_eq!(inserted[1].slug, "rocket");
}

#[tokio::test]
async fn bulk_insert_rejects_whole_batch_on_validation_error() {
    let h = seeded_catalog().await;

    let err = h
        .catalog
        .bulk_insert_products(vec![new_product("anvil", 1, 900), new_product("", 1, -1)])
        .await
        .unwrap_err();

    match err {
        CatalogError::Validation(violations) => {
            // name (derived from the slug), slug and price
            assert_eq!(violations.len(), 3);
            assert!(violations.iter().all(|v| v.row == 1));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(h.catalog.list_products().await.unwrap().len(), 3);
}

#[tokio::test]
async fn bulk_insert_rolls_back_on_storage_error() {
    let h = seeded_catalog().await;

    // Second row references a shop that does not exist.
    let err = h
        .catalog
        .bulk_insert_products(vec![new_product("anvil", 1, 900), new_product("ghost", 77, 10)])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "database");
    assert!(h.catalog.get_product_by_slug("anvil").await.is_err());
}

#[tokio::test]
async fn empty_bulk_insert_is_noop() {
    let h = seeded_catalog().await;
    assert!(h.catalog.bulk_insert_products(Vec::new()).await.unwrap().is_empty());
}

// === Administrative operations ===

#[tokio::test]
async fn admin_operations_report_fixed_messages() {
    let h = empty_catalog();
    assert_eq!(h.catalog.create_schema().await.unwrap(), "Tables has been created!");
    assert_eq!(h.catalog.seed_data().await.unwrap(), "Tables data has been created!");
    assert_eq!(h.catalog.drop_schema().await.unwrap(), "Tables has been removed!");
}

#[tokio::test]
async fn seeding_twice_reports_duplication() {
    let h = seeded_catalog().await;

    let err = h.catalog.seed_data().await.unwrap_err();
    assert!(matches!(err, CatalogError::Duplicated));

    let envelope: Envelope<&str> = Err(err).into();
    assert_eq!(
        serde_json::to_value(&envelope).unwrap()["error"]["message"],
        "Data has been duplicated!"
    );
}

#[tokio::test]
async fn create_schema_twice_passes_raw_error_through() {
    let h = empty_catalog();
    h.catalog.create_schema().await.unwrap();

    let err = h.catalog.create_schema().await.unwrap_err();
    assert_eq!(err.kind(), "database");
}

#[tokio::test]
async fn drop_then_create_leaves_empty_tables() {
    let h = seeded_catalog().await;

    h.catalog.drop_schema().await.unwrap();
    h.catalog.create_schema().await.unwrap();

    assert!(h.catalog.list_shops().await.unwrap().is_empty());
    assert!(h.catalog.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn drop_schema_restores_foreign_key_checks() {
    let h = seeded_catalog().await;
    h.catalog.drop_schema().await.unwrap();
    h.catalog.create_schema().await.unwrap();

    // The admin pool holds at most two connections; both must enforce
    // the shop reference again.
    for _ in 0..2 {
        let err = sqlx::raw_sql(
            "INSERT INTO products (name, slug, price, shop_id) VALUES ('x', 'x', 1, 404)",
        )
        .execute(h.catalog.admin_pool())
        .await
        .unwrap_err();
        assert!(err.to_string().contains("FOREIGN KEY"));
    }
}

#[tokio::test]
async fn dropping_missing_tables_fails_without_leaking() {
    let h = empty_catalog();

    // More failures than the admin pool has connections: a leaked
    // connection per failure would starve the pool and surface as an
    // acquire error.
    for _ in 0..4 {
        let err = h.catalog.drop_schema().await.unwrap_err();
        assert_eq!(err.kind(), "database");
    }

    h.catalog.create_schema().await.unwrap();
    assert!(h.catalog.admin_pool().size() <= 2);
}

// === Timeouts ===

#[tokio::test]
async fn starved_query_times_out_and_pool_recovers() {
    let h = seed(catalog_with(|config| {
        config.pool.max_connections = 1;
        config.pool.acquire_timeout_secs = 10;
        config.query_timeout_secs = 1;
    }))
    .await;

    let held = h.catalog.query_pool().acquire().await.unwrap();
    let err = h.catalog.list_shops().await.unwrap_err();
    assert!(
        matches!(err, CatalogError::Timeout { operation: "list_shops", .. }),
        "unexpected {err:?}"
    );
    assert_eq!(err.kind(), "timeout");

    drop(held);
    assert_eq!(h.catalog.list_shops().await.unwrap().len(), 2);
}

#[tokio::test]
async fn timed_out_drop_never_pools_disabled_foreign_keys() {
    let h = seed(catalog_with(|config| {
        config.query_timeout_secs = 1;
    }))
    .await;

    // An open write transaction on the other pool keeps DROP TABLE waiting
    // on the database lock past the timeout.
    let mut blocker = h.catalog.query_pool().begin().await.unwrap();
    sqlx::query("INSERT INTO shops (name, slug) VALUES ('lock', 'lock')")
        .execute(&mut *blocker)
        .await
        .unwrap();

    let err = h.catalog.drop_schema().await.unwrap_err();
    assert!(
        matches!(err, CatalogError::Timeout { operation: "drop_schema", .. }),
        "unexpected {err:?}"
    );
    blocker.rollback().await.unwrap();

    // Hold every admin connection at once so each one is inspected.
    let admin = h.catalog.admin_pool();
    let mut conns = Vec::new();
    for _ in 0..2 {
        conns.push(admin.acquire().await.unwrap());
    }
    for conn in &mut conns {
        let enabled: i64 = tokio::time::timeout(
            Duration::from_secs(10),
            sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(&mut **conn),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(enabled, 1);
    }
}

// === Acquisition failure ===

fn unreachable_catalog() -> Harness {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    // No `mode=rwc`: the file is never created, so every connect fails.
    let url = format!("sqlite://{}", dir.path().join("missing/catalog.db").display());
    let catalog = Catalog::connect(&config_for(url)).unwrap();
    Harness { catalog, _dir: dir }
}

#[tokio::test]
async fn acquisition_failure_is_reported_not_thrown() {
    let h = unreachable_catalog();
    let pool = h.catalog.admin_pool();
    let idle_before = pool.num_idle();

    for err in [
        h.catalog.create_schema().await.unwrap_err(),
        h.catalog.seed_data().await.unwrap_err(),
        h.catalog.drop_schema().await.unwrap_err(),
    ] {
        assert!(matches!(err, CatalogError::Acquire(_)), "unexpected {err:?}");
    }

    assert_eq!(pool.num_idle(), idle_before);
    assert_eq!(pool.size(), 0);
}

#[tokio::test]
async fn acquisition_failure_fires_each_callback_once() {
    let h = unreachable_catalog();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for op in 0..3 {
        let catalog = h.catalog.clone();
        let calls = Arc::clone(&calls);
        let operation = async move {
            match op {
                0 => catalog.create_schema().await,
                1 => catalog.seed_data().await,
                _ => catalog.drop_schema().await,
            }
        };
        handles.push(spawn_with_callback(operation, move |envelope| {
            assert!(envelope.is_error());
            calls.fetch_add(1, Ordering::SeqCst);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.catalog.admin_pool().size(), 0);
}
