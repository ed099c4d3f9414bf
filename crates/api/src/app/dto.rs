use serde::Deserialize;

use voltmart_carts::Cart;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub model: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn cart_to_json(cart: &Cart) -> serde_json::Value {
    serde_json::json!({
        "id": cart.id().to_string(),
        "customer": cart.customer().as_str(),
        "status": cart.status(),
        "checkout_date": cart.checkout_date().map(|d| d.to_string()),
        "total": cart.total(),
        "items": cart.items().iter().map(|line| serde_json::json!({
            "model": line.model.as_str(),
            "category": line.category.to_string(),
            "unit_price": line.unit_price,
            "quantity": line.quantity,
        })).collect::<Vec<_>>(),
    })
}

pub fn carts_to_json(carts: &[Cart]) -> serde_json::Value {
    serde_json::Value::Array(carts.iter().map(cart_to_json).collect())
}
