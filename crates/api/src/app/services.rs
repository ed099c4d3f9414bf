//! Backing store wiring for the HTTP layer.
//!
//! Without `DATABASE_URL` (or without the `postgres` feature) the service
//! runs on the in-memory adapters with a seeded demo catalog, which is what
//! the black-box tests exercise.

use std::sync::Arc;

use chrono::NaiveDate;

use voltmart_carts::{CartService, InMemoryCartStore};
use voltmart_catalog::{Category, InMemoryCatalog, Product};
use voltmart_core::ProductModel;

pub struct AppServices {
    pub carts: CartService,
}

pub async fn build_services() -> AppServices {
    #[cfg(feature = "postgres")]
    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        return build_postgres_services(&database_url).await;
    }

    build_in_memory_services()
}

fn build_in_memory_services() -> AppServices {
    tracing::info!("using in-memory stores with demo catalog");
    let catalog = Arc::new(InMemoryCatalog::with_products(demo_products()));
    AppServices {
        carts: CartService::new(InMemoryCartStore::arc(), catalog),
    }
}

#[cfg(feature = "postgres")]
async fn build_postgres_services(database_url: &str) -> AppServices {
    use voltmart_infra::{PostgresCartStore, PostgresCatalog};

    let pool = sqlx::PgPool::connect(database_url)
        .await
        .expect("failed to connect to Postgres");
    voltmart_infra::init_schema(&pool)
        .await
        .expect("failed to initialize database schema");

    tracing::info!("using Postgres-backed stores");
    AppServices {
        carts: CartService::new(
            Arc::new(PostgresCartStore::new(pool.clone())),
            Arc::new(PostgresCatalog::new(pool)),
        ),
    }
}

fn demo_products() -> Vec<Product> {
    let arrival = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid demo date");
    let product = |model: &str, category, price, quantity| Product {
        model: ProductModel::new(model).expect("non-empty demo model"),
        category,
        selling_price: price,
        quantity,
        details: None,
        arrival_date: arrival,
    };
    vec![
        product("Realme X2", Category::Smartphone, 5700, 3),
        product("ThinkPad X1", Category::Laptop, 129_900, 5),
        product("LG Fridge", Category::Appliance, 89_900, 0),
    ]
}
