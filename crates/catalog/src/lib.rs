//! Product Catalog collaborator boundary.
//!
//! The catalog is the system of record for product existence, price, category
//! and stock. The cart subsystem consumes it through the [`ProductCatalog`]
//! trait and never owns any of its data.

pub mod catalog;
pub mod product;

pub use catalog::{CatalogError, InMemoryCatalog, ProductCatalog};
pub use product::{Category, Product};
