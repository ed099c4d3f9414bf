//! Cart domain error kinds.
//!
//! Each variant is a distinct, locally detectable precondition failure that
//! the API layer maps to a specific status code. Infrastructure failures
//! (store, catalog) are wrapped as separate variants and stay opaque.

use thiserror::Error;

use voltmart_catalog::CatalogError;
use voltmart_core::{DomainError, ProductModel};

use crate::store::StoreError;

/// Result type for cart operations.
pub type CartResult<T> = Result<T, CartError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// No such catalog entry.
    #[error("product {0} does not exist in the catalog")]
    ProductNotFound(ProductModel),

    /// Zero units available.
    #[error("product {0} has no available stock")]
    OutOfStock(ProductModel),

    /// Requested quantity exceeds current stock (checkout re-validation).
    #[error("product {model} has {available} unit(s) in stock but the cart holds {requested}")]
    InsufficientStock {
        model: ProductModel,
        requested: u32,
        available: u32,
    },

    /// Customer has no active unpaid cart.
    #[error("no active unpaid cart")]
    CartNotFound,

    /// Checkout on a cart with no line items.
    #[error("cannot checkout an empty cart")]
    EmptyCart,

    /// Removal target is not in the cart.
    #[error("product {0} is not in the cart")]
    ProductNotInCart(ProductModel),

    /// Entity-level invariant violation (unexpected on valid call paths).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Persistence failure (opaque infrastructure error).
    #[error("cart store failure: {0}")]
    Store(#[from] StoreError),

    /// Catalog failure (opaque infrastructure error).
    #[error("catalog failure: {0}")]
    Catalog(#[from] CatalogError),
}
