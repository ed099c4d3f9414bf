use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use voltmart_catalog::{Category, Product};
use voltmart_core::{CartId, CustomerId, DomainError, DomainResult, ProductModel};

/// Cart status lifecycle. A cart transitions `Unpaid -> Paid` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
    Unpaid,
    Paid,
}

/// One product line within a cart.
///
/// `category` and `unit_price` are snapshots taken when the line is first
/// created; they are never re-resolved from the catalog, so paid carts keep
/// their historical pricing even if the catalog changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub model: ProductModel,
    pub category: Category,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    /// Always >= 1 while the line exists; a line at 0 is deleted, never stored.
    pub quantity: u32,
}

impl LineItem {
    pub fn subtotal(&self) -> u64 {
        self.unit_price * u64::from(self.quantity)
    }
}

/// Outcome of removing one unit from a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovedUnit {
    /// The line still has units left; carries the updated line.
    Decremented(LineItem),
    /// The last unit was removed and the line was deleted.
    Deleted { unit_price: u64 },
}

/// One shopping session for one customer.
///
/// Invariants enforced here:
/// - `total` always equals the sum of `quantity * unit_price` over all lines
/// - at most one line per product model
/// - paid carts are immutable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    id: CartId,
    customer: CustomerId,
    status: CartStatus,
    checkout_date: Option<NaiveDate>,
    /// Running sum in smallest currency unit (e.g., cents).
    total: u64,
    items: Vec<LineItem>,
}

impl Cart {
    /// Create a fresh, empty, unpaid cart for a customer.
    pub fn new_unpaid(customer: CustomerId) -> Self {
        Self {
            id: CartId::new(),
            customer,
            status: CartStatus::Unpaid,
            checkout_date: None,
            total: 0,
            items: Vec::new(),
        }
    }

    /// Rehydrate a cart from stored parts. Store implementations only.
    pub fn from_parts(
        id: CartId,
        customer: CustomerId,
        status: CartStatus,
        checkout_date: Option<NaiveDate>,
        total: u64,
        items: Vec<LineItem>,
    ) -> Self {
        Self {
            id,
            customer,
            status,
            checkout_date,
            total,
            items,
        }
    }

    pub fn id(&self) -> CartId {
        self.id
    }

    pub fn customer(&self) -> &CustomerId {
        &self.customer
    }

    pub fn status(&self) -> CartStatus {
        self.status
    }

    pub fn checkout_date(&self) -> Option<NaiveDate> {
        self.checkout_date
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_paid(&self) -> bool {
        self.status == CartStatus::Paid
    }

    pub fn find_item(&self, model: &ProductModel) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.model == model)
    }

    /// Recompute the total from the lines (for invariant checks).
    pub fn items_total(&self) -> u64 {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    fn ensure_unpaid(&self) -> DomainResult<()> {
        if self.is_paid() {
            return Err(DomainError::invariant("paid carts are immutable"));
        }
        Ok(())
    }

    /// Add one unit of a product, snapshotting category and price if the
    /// product is not yet in the cart. Returns the updated line.
    pub fn add_unit(&mut self, product: &Product) -> DomainResult<LineItem> {
        self.ensure_unpaid()?;

        let line = match self.items.iter_mut().find(|i| i.model == product.model) {
            Some(line) => {
                line.quantity += 1;
                self.total += line.unit_price;
                line.clone()
            }
            None => {
                let line = LineItem {
                    model: product.model.clone(),
                    category: product.category,
                    unit_price: product.selling_price,
                    quantity: 1,
                };
                self.total += line.unit_price;
                self.items.push(line.clone());
                line
            }
        };

        Ok(line)
    }

    /// Remove one unit of a product; the line is deleted once it reaches zero.
    ///
    /// Fails with `DomainError::NotFound` when the cart has no line for the
    /// model (including the empty-cart case).
    pub fn remove_unit(&mut self, model: &ProductModel) -> DomainResult<RemovedUnit> {
        self.ensure_unpaid()?;

        let pos = self
            .items
            .iter()
            .position(|i| &i.model == model)
            .ok_or_else(DomainError::not_found)?;

        let unit_price = self.items[pos].unit_price;
        self.total -= unit_price;

        if self.items[pos].quantity == 1 {
            self.items.remove(pos);
            Ok(RemovedUnit::Deleted { unit_price })
        } else {
            self.items[pos].quantity -= 1;
            Ok(RemovedUnit::Decremented(self.items[pos].clone()))
        }
    }

    /// Delete all lines and reset the total, keeping the cart active.
    pub fn clear(&mut self) -> DomainResult<()> {
        self.ensure_unpaid()?;
        self.items.clear();
        self.total = 0;
        Ok(())
    }

    /// Finalize the cart: `Unpaid -> Paid`, exactly once, never on an empty
    /// cart.
    pub fn mark_paid(&mut self, date: NaiveDate) -> DomainResult<()> {
        self.ensure_unpaid()?;
        if self.is_empty() {
            return Err(DomainError::validation("cannot pay for an empty cart"));
        }
        self.status = CartStatus::Paid;
        self.checkout_date = Some(date);
        Ok(())
    }
}
