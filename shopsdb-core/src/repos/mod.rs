//! Repository implementations for catalog reads and the product batch insert
//!
//! Repositories borrow the query pool; they hold no state of their own.

pub mod products;
pub mod shops;

pub use products::ProductRepo;
pub use shops::ShopRepo;
