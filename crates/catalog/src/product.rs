use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use voltmart_core::ProductModel;

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Category {
    Smartphone,
    Laptop,
    Appliance,
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Category::Smartphone => "Smartphone",
            Category::Laptop => "Laptop",
            Category::Appliance => "Appliance",
        };
        f.write_str(s)
    }
}

impl core::str::FromStr for Category {
    type Err = voltmart_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Smartphone" => Ok(Category::Smartphone),
            "Laptop" => Ok(Category::Laptop),
            "Appliance" => Ok(Category::Appliance),
            other => Err(voltmart_core::DomainError::validation(format!(
                "unknown category: {other}"
            ))),
        }
    }
}

/// A catalog entry, keyed by model.
///
/// The cart subsystem treats this as a read-only snapshot source: line items
/// copy `category` and `selling_price` at add time and never re-resolve them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub model: ProductModel,
    pub category: Category,
    /// Price in smallest currency unit (e.g., cents).
    pub selling_price: u64,
    /// Units currently in stock.
    pub quantity: u32,
    pub details: Option<String>,
    pub arrival_date: NaiveDate,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}
