//! Catalog access contract + in-memory implementation for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use voltmart_core::ProductModel;

use crate::product::Product;

/// Catalog access error (infrastructure-level, opaque to callers).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog storage error: {0}")]
    Storage(String),
}

/// Product Catalog contract consumed by the cart subsystem.
///
/// Product registration, pricing and quantity management live behind this
/// boundary; the cart side only reads entries and (eventually) writes stock
/// levels back.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look up a product by model. `Ok(None)` means no such catalog entry.
    async fn get_by_model(&self, model: &ProductModel) -> Result<Option<Product>, CatalogError>;

    /// Set the absolute stock quantity for a model.
    async fn set_quantity(&self, model: &ProductModel, quantity: u32) -> Result<(), CatalogError>;
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductModel, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog with a fixed set of products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let map = products
            .into_iter()
            .map(|p| (p.model.clone(), p))
            .collect();
        Self {
            products: RwLock::new(map),
        }
    }

    pub fn insert(&self, product: Product) {
        let mut map = self
            .products
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        map.insert(product.model.clone(), product);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get_by_model(&self, model: &ProductModel) -> Result<Option<Product>, CatalogError> {
        let map = self
            .products
            .read()
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        Ok(map.get(model).cloned())
    }

    async fn set_quantity(&self, model: &ProductModel, quantity: u32) -> Result<(), CatalogError> {
        let mut map = self
            .products
            .write()
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        match map.get_mut(model) {
            Some(product) => {
                product.quantity = quantity;
                Ok(())
            }
            None => Err(CatalogError::Storage(format!(
                "no catalog entry for model {model}"
            ))),
        }
    }
}
