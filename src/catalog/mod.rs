//! Catalog Lookup
//!
//! Read-only access to the merch table. Items are seeded by migrations and
//! administered outside this service.

mod repository;

pub use repository::{CatalogError, CatalogItem, CatalogRepository};
