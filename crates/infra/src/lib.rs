//! Infrastructure layer: Postgres-backed cart and catalog storage.

pub mod postgres;
pub mod schema;


pub use postgres::{PostgresCartStore, PostgresCatalog};
pub use schema::init_schema;
