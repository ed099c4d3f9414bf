//! Cart persistence contract + in-memory implementation.
//!
//! The store persists cart headers and line items and carries no business
//! rules, with one deliberate exception: the `(owner, Unpaid)` uniqueness
//! constraint is enforced here, at the storage boundary, so no call sequence
//! can produce two active carts for one customer.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;

use voltmart_core::{CartId, CustomerId, ProductModel};

use crate::cart::{Cart, CartStatus, LineItem};

/// Cart store error (infrastructure-level, distinct from domain errors).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("cart not found: {0}")]
    CartNotFound(CartId),
    #[error("an unpaid cart already exists for customer {0}")]
    UnpaidCartExists(CustomerId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Cart store abstraction: headers + line items, no business rules.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fetch a customer's unpaid cart, hydrated with its line items.
    async fn find_unpaid(&self, customer: &CustomerId) -> Result<Option<Cart>, StoreError>;

    /// Fetch a customer's paid carts in stable insertion order.
    async fn find_paid(&self, customer: &CustomerId) -> Result<Vec<Cart>, StoreError>;

    /// Fetch every cart of every customer, any status.
    async fn find_all(&self) -> Result<Vec<Cart>, StoreError>;

    /// Insert a new cart (header + any lines it already carries).
    /// Rejects a second unpaid cart for the same owner.
    async fn insert_cart(&self, cart: &Cart) -> Result<(), StoreError>;

    /// Update a cart's header fields (status, checkout date, total).
    async fn update_header(&self, cart: &Cart) -> Result<(), StoreError>;

    /// Insert or replace one line item of a cart.
    async fn upsert_item(&self, cart_id: CartId, item: &LineItem) -> Result<(), StoreError>;

    /// Delete one line item of a cart.
    async fn delete_item(&self, cart_id: CartId, model: &ProductModel) -> Result<(), StoreError>;

    /// Delete all line items of a cart, keeping the header.
    async fn clear_items(&self, cart_id: CartId) -> Result<(), StoreError>;

    /// Delete one cart, header and lines.
    async fn delete_cart(&self, cart_id: CartId) -> Result<(), StoreError>;

    /// Administrative wipe: delete every cart of every customer.
    async fn delete_all(&self) -> Result<(), StoreError>;
}

/// Stored header row (lines live in a separate map, like the real schema).
#[derive(Debug, Clone)]
struct CartHeader {
    id: CartId,
    customer: CustomerId,
    status: CartStatus,
    checkout_date: Option<NaiveDate>,
    total: u64,
}

impl CartHeader {
    fn of(cart: &Cart) -> Self {
        Self {
            id: cart.id(),
            customer: cart.customer().clone(),
            status: cart.status(),
            checkout_date: cart.checkout_date(),
            total: cart.total(),
        }
    }
}

/// In-memory cart store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    // Vec keeps insertion order stable for `find_paid` / `find_all`.
    headers: RwLock<Vec<CartHeader>>,
    items: RwLock<HashMap<CartId, Vec<LineItem>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn hydrate(&self, header: &CartHeader) -> Result<Cart, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .get(&header.id)
            .cloned()
            .unwrap_or_default();
        Ok(Cart::from_parts(
            header.id,
            header.customer.clone(),
            header.status,
            header.checkout_date,
            header.total,
            items,
        ))
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn find_unpaid(&self, customer: &CustomerId) -> Result<Option<Cart>, StoreError> {
        let header = {
            let headers = self
                .headers
                .read()
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            headers
                .iter()
                .find(|h| &h.customer == customer && h.status == CartStatus::Unpaid)
                .cloned()
        };
        header.map(|h| self.hydrate(&h)).transpose()
    }

    async fn find_paid(&self, customer: &CustomerId) -> Result<Vec<Cart>, StoreError> {
        let matching: Vec<CartHeader> = {
            let headers = self
                .headers
                .read()
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            headers
                .iter()
                .filter(|h| &h.customer == customer && h.status == CartStatus::Paid)
                .cloned()
                .collect()
        };
        matching.iter().map(|h| self.hydrate(h)).collect()
    }

    async fn find_all(&self) -> Result<Vec<Cart>, StoreError> {
        let all: Vec<CartHeader> = {
            let headers = self
                .headers
                .read()
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            headers.clone()
        };
        all.iter().map(|h| self.hydrate(h)).collect()
    }

    async fn insert_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        let mut headers = self
            .headers
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        if cart.status() == CartStatus::Unpaid
            && headers
                .iter()
                .any(|h| h.customer == *cart.customer() && h.status == CartStatus::Unpaid)
        {
            return Err(StoreError::UnpaidCartExists(cart.customer().clone()));
        }

        headers.push(CartHeader::of(cart));
        self.items
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .insert(cart.id(), cart.items().to_vec());
        Ok(())
    }

    async fn update_header(&self, cart: &Cart) -> Result<(), StoreError> {
        let mut headers = self
            .headers
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let header = headers
            .iter_mut()
            .find(|h| h.id == cart.id())
            .ok_or(StoreError::CartNotFound(cart.id()))?;
        header.status = cart.status();
        header.checkout_date = cart.checkout_date();
        header.total = cart.total();
        Ok(())
    }

    async fn upsert_item(&self, cart_id: CartId, item: &LineItem) -> Result<(), StoreError> {
        self.ensure_cart_exists(cart_id)?;
        let mut items = self
            .items
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let lines = items.entry(cart_id).or_default();
        match lines.iter_mut().find(|l| l.model == item.model) {
            Some(line) => *line = item.clone(),
            None => lines.push(item.clone()),
        }
        Ok(())
    }

    async fn delete_item(&self, cart_id: CartId, model: &ProductModel) -> Result<(), StoreError> {
        self.ensure_cart_exists(cart_id)?;
        let mut items = self
            .items
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        if let Some(lines) = items.get_mut(&cart_id) {
            lines.retain(|l| &l.model != model);
        }
        Ok(())
    }

    async fn clear_items(&self, cart_id: CartId) -> Result<(), StoreError> {
        self.ensure_cart_exists(cart_id)?;
        let mut items = self
            .items
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        items.insert(cart_id, Vec::new());
        Ok(())
    }

    async fn delete_cart(&self, cart_id: CartId) -> Result<(), StoreError> {
        let mut headers = self
            .headers
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let before = headers.len();
        headers.retain(|h| h.id != cart_id);
        if headers.len() == before {
            return Err(StoreError::CartNotFound(cart_id));
        }
        self.items
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .remove(&cart_id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.headers
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .clear();
        self.items
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .clear();
        Ok(())
    }
}

impl InMemoryCartStore {
    fn ensure_cart_exists(&self, cart_id: CartId) -> Result<(), StoreError> {
        let headers = self
            .headers
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        if headers.iter().any(|h| h.id == cart_id) {
            Ok(())
        } else {
            Err(StoreError::CartNotFound(cart_id))
        }
    }
}
