/// Access token claims
///
/// The client never holds the signing key, so claims are read without
/// signature verification. They only drive local decisions such as
/// refreshing ahead of expiry; the backend remains the authority.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims of interest in a backend-issued access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: Option<i64>,
    /// Issued at (Unix timestamp)
    pub iat: Option<i64>,
    pub role: Option<String>,
}

impl Claims {
    /// Decode the payload of `token` without checking its signature.
    ///
    /// Returns `None` for opaque (non-JWT) tokens.
    pub fn peek(token: &str) -> Option<Self> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Check if token has expired
    pub fn is_expired(&self) -> bool {
        match self.exp {
            Some(exp) => exp < Utc::now().timestamp(),
            None => false,
        }
    }
}

/// Expiry of `token` according to its `exp` claim, if it carries one.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    Claims::peek(token).and_then(|claims| claims.expires_at())
}
