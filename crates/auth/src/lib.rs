//! Authentication/authorization boundary for the API layer.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! roles, token claims, and deterministic claim validation. Session and
//! password management belong to the (external) user system.

pub mod claims;
pub mod jwt;
pub mod roles;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{AuthError, Hs256JwtValidator, JwtValidator};
pub use roles::Role;
