//! Cart routes.
//!
//! Customer surface (owner inferred from the token):
//! - `GET    /carts`                  current cart (always 200, maybe empty)
//! - `POST   /carts`                  add one unit of `{ "model": ... }`
//! - `PATCH  /carts`                  check out the current cart
//! - `GET    /carts/history`          paid carts, oldest first
//! - `DELETE /carts/products/:model`  remove one unit of a model
//! - `DELETE /carts/current`          empty the current cart
//!
//! Staff surface:
//! - `GET    /carts/all`              every cart of every customer
//! - `DELETE /carts`                  wipe all carts

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};

use voltmart_core::ProductModel;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route(
            "/carts",
            get(get_current)
                .post(add_product)
                .patch(checkout)
                .delete(delete_all),
        )
        .route("/carts/history", get(history))
        .route("/carts/current", delete(clear_current))
        .route("/carts/all", get(get_all))
        .route("/carts/products/:model", delete(remove_product))
}

fn parse_model(raw: String) -> Result<ProductModel, axum::response::Response> {
    ProductModel::new(raw).map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_model",
            "model cannot be empty",
        )
    })
}

pub async fn get_current(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_customer(&principal) {
        return resp;
    }
    match services.carts.get_current_cart(principal.customer()).await {
        Ok(cart) => Json(dto::cart_to_json(&cart)).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn add_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::AddProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_customer(&principal) {
        return resp;
    }
    let model = match parse_model(body.model) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    if let Err(e) = services.carts.add_product(principal.customer(), &model).await {
        return errors::cart_error_to_response(e);
    }
    match services.carts.get_current_cart(principal.customer()).await {
        Ok(cart) => Json(dto::cart_to_json(&cart)).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_customer(&principal) {
        return resp;
    }
    match services.carts.checkout(principal.customer()).await {
        Ok(cart) => Json(dto::cart_to_json(&cart)).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_customer(&principal) {
        return resp;
    }
    match services
        .carts
        .get_customer_cart_history(principal.customer())
        .await
    {
        Ok(carts) => Json(dto::carts_to_json(&carts)).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn remove_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(model): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_customer(&principal) {
        return resp;
    }
    let model = match parse_model(model) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    if let Err(e) = services
        .carts
        .remove_product(principal.customer(), &model)
        .await
    {
        return errors::cart_error_to_response(e);
    }
    match services.carts.get_current_cart(principal.customer()).await {
        Ok(cart) => Json(dto::cart_to_json(&cart)).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn clear_current(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_customer(&principal) {
        return resp;
    }
    match services.carts.clear_current_cart(principal.customer()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn get_all(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_staff(&principal) {
        return resp;
    }
    match services.carts.get_all_carts().await {
        Ok(carts) => Json(dto::carts_to_json(&carts)).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn delete_all(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_staff(&principal) {
        return resp;
    }
    match services.carts.delete_all_carts().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}
