//! Postgres-backed cart store and product catalog.
//!
//! Carts are split across two tables, `carts` (header: owner, status,
//! checkout date, total) and `cart_items` (one row per model). A partial
//! unique index on `carts (customer) WHERE status = 'unpaid'` makes a second
//! active cart per customer impossible to insert, mirroring what
//! `InMemoryCartStore` enforces with its header scan.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use voltmart_carts::{Cart, CartStatus, CartStore, LineItem, StoreError};
use voltmart_catalog::{CatalogError, Category, Product, ProductCatalog};
use voltmart_core::{CartId, CustomerId, ProductModel};

const UNPAID_INDEX: &str = "carts_one_unpaid_per_customer";

fn storage(err: sqlx::Error) -> StoreError {
    StoreError::Storage(err.to_string())
}

fn status_as_str(status: CartStatus) -> &'static str {
    match status {
        CartStatus::Unpaid => "unpaid",
        CartStatus::Paid => "paid",
    }
}

fn status_from_str(raw: &str) -> Result<CartStatus, StoreError> {
    match raw {
        "unpaid" => Ok(CartStatus::Unpaid),
        "paid" => Ok(CartStatus::Paid),
        other => Err(StoreError::Storage(format!("unknown cart status: {other}"))),
    }
}

fn money_from_db(raw: i64, column: &str) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| StoreError::Storage(format!("negative {column} in database")))
}

fn money_to_db(value: u64, column: &str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Storage(format!("{column} overflows BIGINT")))
}

/// Persistent cart store over a SQLx connection pool.
pub struct PostgresCartStore {
    pool: Arc<PgPool>,
}

impl PostgresCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn item_from_row(row: &PgRow) -> Result<LineItem, StoreError> {
        let model: String = row.try_get("model").map_err(storage)?;
        let category: String = row.try_get("category").map_err(storage)?;
        let unit_price: i64 = row.try_get("unit_price").map_err(storage)?;
        let quantity: i32 = row.try_get("quantity").map_err(storage)?;
        Ok(LineItem {
            model: ProductModel::new(model).map_err(|e| StoreError::Storage(e.to_string()))?,
            category: Category::from_str(&category)
                .map_err(|e| StoreError::Storage(e.to_string()))?,
            unit_price: money_from_db(unit_price, "unit_price")?,
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::Storage("negative quantity in database".into()))?,
        })
    }

    async fn load_items(&self, cart_id: CartId) -> Result<Vec<LineItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT model, category, unit_price, quantity FROM cart_items \
             WHERE cart_id = $1 ORDER BY model",
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(storage)?;
        rows.iter().map(Self::item_from_row).collect()
    }

    async fn hydrate(&self, row: &PgRow) -> Result<Cart, StoreError> {
        let id = CartId::from_uuid(row.try_get("id").map_err(storage)?);
        let customer: String = row.try_get("customer").map_err(storage)?;
        let status: String = row.try_get("status").map_err(storage)?;
        let checkout_date: Option<NaiveDate> = row.try_get("checkout_date").map_err(storage)?;
        let total: i64 = row.try_get("total").map_err(storage)?;

        let items = self.load_items(id).await?;
        Ok(Cart::from_parts(
            id,
            CustomerId::new(customer).map_err(|e| StoreError::Storage(e.to_string()))?,
            status_from_str(&status)?,
            checkout_date,
            money_from_db(total, "total")?,
            items,
        ))
    }

    async fn hydrate_all(&self, rows: Vec<PgRow>) -> Result<Vec<Cart>, StoreError> {
        let mut carts = Vec::with_capacity(rows.len());
        for row in &rows {
            carts.push(self.hydrate(row).await?);
        }
        Ok(carts)
    }

    async fn ensure_cart_exists(&self, cart_id: CartId) -> Result<(), StoreError> {
        let row = sqlx::query("SELECT 1 FROM carts WHERE id = $1")
            .bind(cart_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(storage)?;
        match row {
            Some(_) => Ok(()),
            None => Err(StoreError::CartNotFound(cart_id)),
        }
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn find_unpaid(&self, customer: &CustomerId) -> Result<Option<Cart>, StoreError> {
        let row = sqlx::query(
            "SELECT id, customer, status, checkout_date, total FROM carts \
             WHERE customer = $1 AND status = 'unpaid'",
        )
        .bind(customer.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage)?;
        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn find_paid(&self, customer: &CustomerId) -> Result<Vec<Cart>, StoreError> {
        // UUIDv7 keys are time-ordered, so ordering by id preserves the order
        // in which carts were opened.
        let rows = sqlx::query(
            "SELECT id, customer, status, checkout_date, total FROM carts \
             WHERE customer = $1 AND status = 'paid' ORDER BY id",
        )
        .bind(customer.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(storage)?;
        self.hydrate_all(rows).await
    }

    async fn find_all(&self) -> Result<Vec<Cart>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, customer, status, checkout_date, total FROM carts ORDER BY id",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(storage)?;
        self.hydrate_all(rows).await
    }

    async fn insert_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let inserted = sqlx::query(
            "INSERT INTO carts (id, customer, status, checkout_date, total) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(cart.id().as_uuid())
        .bind(cart.customer().as_str())
        .bind(status_as_str(cart.status()))
        .bind(cart.checkout_date())
        .bind(money_to_db(cart.total(), "total")?)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            if let sqlx::Error::Database(db) = &err {
                if db.constraint() == Some(UNPAID_INDEX) {
                    return Err(StoreError::UnpaidCartExists(cart.customer().clone()));
                }
            }
            return Err(storage(err));
        }

        for item in cart.items() {
            sqlx::query(
                "INSERT INTO cart_items (cart_id, model, category, unit_price, quantity) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(cart.id().as_uuid())
            .bind(item.model.as_str())
            .bind(item.category.to_string())
            .bind(money_to_db(item.unit_price, "unit_price")?)
            .bind(i32::try_from(item.quantity).map_err(|_| {
                StoreError::Storage("quantity overflows INTEGER".into())
            })?)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)
    }

    async fn update_header(&self, cart: &Cart) -> Result<(), StoreError> {
        // The status guard means a cart can never be paid twice: once the
        // first checkout commits, a concurrent second one matches zero rows.
        let result = sqlx::query(
            "UPDATE carts SET status = $2, checkout_date = $3, total = $4 \
             WHERE id = $1 AND status = 'unpaid'",
        )
        .bind(cart.id().as_uuid())
        .bind(status_as_str(cart.status()))
        .bind(cart.checkout_date())
        .bind(money_to_db(cart.total(), "total")?)
        .execute(&*self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::CartNotFound(cart.id()));
        }
        Ok(())
    }

    async fn upsert_item(&self, cart_id: CartId, item: &LineItem) -> Result<(), StoreError> {
        self.ensure_cart_exists(cart_id).await?;
        sqlx::query(
            "INSERT INTO cart_items (cart_id, model, category, unit_price, quantity) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (cart_id, model) DO UPDATE \
             SET category = EXCLUDED.category, \
                 unit_price = EXCLUDED.unit_price, \
                 quantity = EXCLUDED.quantity",
        )
        .bind(cart_id.as_uuid())
        .bind(item.model.as_str())
        .bind(item.category.to_string())
        .bind(money_to_db(item.unit_price, "unit_price")?)
        .bind(
            i32::try_from(item.quantity)
                .map_err(|_| StoreError::Storage("quantity overflows INTEGER".into()))?,
        )
        .execute(&*self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn delete_item(&self, cart_id: CartId, model: &ProductModel) -> Result<(), StoreError> {
        self.ensure_cart_exists(cart_id).await?;
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND model = $2")
            .bind(cart_id.as_uuid())
            .bind(model.as_str())
            .execute(&*self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn clear_items(&self, cart_id: CartId) -> Result<(), StoreError> {
        self.ensure_cart_exists(cart_id).await?;
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn delete_cart(&self, cart_id: CartId) -> Result<(), StoreError> {
        // cart_items rows go with the header via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(cart_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::CartNotFound(cart_id));
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM carts")
            .execute(&*self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }
}

/// Persistent product catalog over a SQLx connection pool.
pub struct PostgresCatalog {
    pool: Arc<PgPool>,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn product_from_row(row: &PgRow) -> Result<Product, CatalogError> {
        let catalog_err = |msg: String| CatalogError::Storage(msg);
        let model: String = row.try_get("model").map_err(|e| catalog_err(e.to_string()))?;
        let category: String = row
            .try_get("category")
            .map_err(|e| catalog_err(e.to_string()))?;
        let selling_price: i64 = row
            .try_get("selling_price")
            .map_err(|e| catalog_err(e.to_string()))?;
        let quantity: i32 = row
            .try_get("quantity")
            .map_err(|e| catalog_err(e.to_string()))?;
        let details: Option<String> = row
            .try_get("details")
            .map_err(|e| catalog_err(e.to_string()))?;
        let arrival_date: NaiveDate = row
            .try_get("arrival_date")
            .map_err(|e| catalog_err(e.to_string()))?;

        Ok(Product {
            model: ProductModel::new(model).map_err(|e| catalog_err(e.to_string()))?,
            category: Category::from_str(&category).map_err(|e| catalog_err(e.to_string()))?,
            selling_price: u64::try_from(selling_price)
                .map_err(|_| catalog_err("negative selling_price in database".into()))?,
            quantity: u32::try_from(quantity)
                .map_err(|_| catalog_err("negative quantity in database".into()))?,
            details,
            arrival_date,
        })
    }
}

#[async_trait]
impl ProductCatalog for PostgresCatalog {
    async fn get_by_model(&self, model: &ProductModel) -> Result<Option<Product>, CatalogError> {
        let row = sqlx::query(
            "SELECT model, category, selling_price, quantity, details, arrival_date \
             FROM products WHERE model = $1",
        )
        .bind(model.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| CatalogError::Storage(e.to_string()))?;
        row.as_ref().map(Self::product_from_row).transpose()
    }

    async fn set_quantity(&self, model: &ProductModel, quantity: u32) -> Result<(), CatalogError> {
        let result = sqlx::query("UPDATE products SET quantity = $2 WHERE model = $1")
            .bind(model.as_str())
            .bind(i32::try_from(quantity).map_err(|_| {
                CatalogError::Storage("quantity overflows INTEGER".into())
            })?)
            .execute(&*self.pool)
            .await
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::Storage(format!(
                "no catalog entry for model {model}"
            )));
        }
        Ok(())
    }
}
