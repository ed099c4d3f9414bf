//! Token decoding and signature verification (HS256).

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Malformed token or bad signature. Deliberately opaque.
    #[error("invalid token")]
    InvalidToken,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Token validation seam consumed by the HTTP middleware.
pub trait JwtValidator: Send + Sync {
    /// Verify the signature and the claim time window, returning the claims.
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError>;
}

/// HS256 validator over a shared secret.
pub struct Hs256JwtValidator {
    decoding_key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError> {
        // Time-window checks go through `validate_claims` so the rules stay
        // deterministic and testable; jsonwebtoken only checks the signature.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};
    use voltmart_core::CustomerId;

    fn mint(secret: &str, claims: &JwtClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims_valid_for(minutes: i64) -> JwtClaims {
        let now = Utc::now();
        JwtClaims {
            sub: CustomerId::new("ada").unwrap(),
            role: Role::Customer,
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::minutes(minutes),
        }
    }

    #[test]
    fn round_trip_recovers_claims() {
        let validator = Hs256JwtValidator::new("test-secret");
        let claims = claims_valid_for(10);
        let token = mint("test-secret", &claims);

        let decoded = validator.validate(&token, Utc::now()).unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.role, Role::Customer);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let validator = Hs256JwtValidator::new("test-secret");
        let token = mint("other-secret", &claims_valid_for(10));
        assert_eq!(
            validator.validate(&token, Utc::now()),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_rejected_by_claim_rules() {
        let validator = Hs256JwtValidator::new("test-secret");
        let token = mint("test-secret", &claims_valid_for(10));
        let later = Utc::now() + Duration::hours(1);
        assert_eq!(
            validator.validate(&token, later),
            Err(AuthError::Claims(TokenValidationError::Expired))
        );
    }

    #[test]
    fn garbage_token_is_rejected() {
        let validator = Hs256JwtValidator::new("test-secret");
        assert_eq!(
            validator.validate("not-a-jwt", Utc::now()),
            Err(AuthError::InvalidToken)
        );
    }
}
