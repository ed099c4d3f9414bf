use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use voltmart_carts::CartError;

/// Map a cart service error to an HTTP response.
///
/// Missing things are 404s, stock conflicts are 409s, an empty cart at
/// checkout is a 400, and infrastructure faults are 503s.
pub fn cart_error_to_response(err: CartError) -> axum::response::Response {
    match err {
        CartError::ProductNotFound(model) => json_error(
            StatusCode::NOT_FOUND,
            "product_not_found",
            format!("no catalog entry for model {model}"),
        ),
        CartError::CartNotFound => {
            json_error(StatusCode::NOT_FOUND, "cart_not_found", "no active cart")
        }
        CartError::ProductNotInCart(model) => json_error(
            StatusCode::NOT_FOUND,
            "product_not_in_cart",
            format!("model {model} is not in the cart"),
        ),
        CartError::OutOfStock(model) => json_error(
            StatusCode::CONFLICT,
            "out_of_stock",
            format!("model {model} is out of stock"),
        ),
        CartError::InsufficientStock {
            model,
            requested,
            available,
        } => json_error(
            StatusCode::CONFLICT,
            "insufficient_stock",
            format!("model {model}: requested {requested}, available {available}"),
        ),
        CartError::EmptyCart => json_error(
            StatusCode::BAD_REQUEST,
            "empty_cart",
            "cannot check out an empty cart",
        ),
        CartError::Domain(e) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", e.to_string())
        }
        CartError::Store(e) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "store_error",
            e.to_string(),
        ),
        CartError::Catalog(e) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "catalog_error",
            e.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
