//! Role guards applied at the route boundary.
//!
//! Cart ownership routes belong to customers; the administrative surface
//! (view or wipe every cart) belongs to managers and admins. The guards run
//! before any service call so handlers stay role-agnostic below this line.

use axum::http::StatusCode;
use axum::response::Response;

use voltmart_auth::Role;

use crate::app::errors;
use crate::context::PrincipalContext;

/// Require the customer role (cart-owning routes).
pub fn require_customer(principal: &PrincipalContext) -> Result<(), Response> {
    if principal.role() == Role::Customer {
        Ok(())
    } else {
        Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "customer role required",
        ))
    }
}

/// Require a staff role (manager or admin).
pub fn require_staff(principal: &PrincipalContext) -> Result<(), Response> {
    if principal.role().is_staff() {
        Ok(())
    } else {
        Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "staff role required",
        ))
    }
}
