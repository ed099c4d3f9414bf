//! Schema bootstrap for the cart and catalog tables.

use sqlx::PgPool;

/// The partial unique index is what enforces the one-unpaid-cart-per-customer
/// rule at the storage layer; `PostgresCartStore::insert_cart` translates the
/// resulting constraint violation into `StoreError::UnpaidCartExists`.
const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        model         TEXT PRIMARY KEY,
        category      TEXT NOT NULL,
        selling_price BIGINT NOT NULL CHECK (selling_price >= 0),
        quantity      INTEGER NOT NULL CHECK (quantity >= 0),
        details       TEXT,
        arrival_date  DATE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS carts (
        id            UUID PRIMARY KEY,
        customer      TEXT NOT NULL,
        status        TEXT NOT NULL CHECK (status IN ('unpaid', 'paid')),
        checkout_date DATE,
        total         BIGINT NOT NULL DEFAULT 0 CHECK (total >= 0)
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS carts_one_unpaid_per_customer
        ON carts (customer) WHERE status = 'unpaid'
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cart_items (
        cart_id    UUID NOT NULL REFERENCES carts (id) ON DELETE CASCADE,
        model      TEXT NOT NULL,
        category   TEXT NOT NULL,
        unit_price BIGINT NOT NULL CHECK (unit_price >= 0),
        quantity   INTEGER NOT NULL CHECK (quantity >= 1),
        PRIMARY KEY (cart_id, model)
    )
    "#,
];

/// Create the tables and indexes if they do not exist yet. Idempotent, so it
/// is safe to run on every startup.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("database schema ensured");
    Ok(())
}
