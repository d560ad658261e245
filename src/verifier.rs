//! Token verifier — parses and cryptographically validates bearer tokens.
//!
//! Exactly one signing algorithm (RS256) is accepted. There is no
//! `alg=none` and no symmetric fallback under any circumstances; the
//! algorithm pin is checked before any key lookup so that a token
//! declaring anything else is rejected without touching the cache or the
//! network.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::key_cache::KeyCache;
use crate::{AuthError, Result};

/// Claims asserted by the identity provider in a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (opaque provider-side user ID).
    pub sub: String,
    /// Provider-side username, the primary local-identity lookup key.
    #[serde(default)]
    pub preferred_username: String,
    /// Email address, the fallback lookup key.
    #[serde(default)]
    pub email: String,
    /// Whether the provider has verified the email address.
    #[serde(default)]
    pub email_verified: bool,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Given name.
    #[serde(default)]
    pub given_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub family_name: Option<String>,
    /// Issuer URL, compared exactly against the configured expected value.
    pub iss: String,
    /// Expiry (Unix timestamp). Enforced during signature validation.
    pub exp: u64,
    /// Issued-at (Unix timestamp).
    #[serde(default)]
    pub iat: u64,
}

/// Verifies bearer tokens against keys from the [`KeyCache`].
pub struct TokenVerifier {
    keys: Arc<KeyCache>,
    expected_issuer: String,
}

impl TokenVerifier {
    /// Create a verifier bound to a key cache and an expected issuer
    /// (`{base_url}/realms/{realm}`).
    #[must_use]
    pub fn new(keys: Arc<KeyCache>, expected_issuer: String) -> Self {
        Self {
            keys,
            expected_issuer,
        }
    }

    /// Validate a bearer token and return its claims.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MalformedToken`] — unparsable header/payload, or no `kid`.
    /// - [`AuthError::UnsupportedAlgorithm`] — any algorithm but RS256.
    /// - [`AuthError::UnknownKey`] / [`AuthError::KeySetFetch`] — key resolution.
    /// - [`AuthError::BadSignature`] — signature verification failed; terminal,
    ///   never retried.
    /// - [`AuthError::Expired`] — past the `exp` claim.
    /// - [`AuthError::IssuerMismatch`] — `iss` differs from the configured issuer.
    pub async fn verify(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header.kid.ok_or(AuthError::MalformedToken)?;

        let key = self.keys.get(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 60; // clock skew tolerance between IdP and host
        validation.validate_aud = false;

        let token_data = decode::<Claims>(token, &key, &validation).map_err(map_jwt_error)?;
        let claims = token_data.claims;

        if claims.iss != self.expected_issuer {
            return Err(AuthError::IssuerMismatch {
                expected: self.expected_issuer.clone(),
                actual: claims.iss,
            });
        }

        debug!(subject = %claims.sub, kid = %kid, "Token signature and claims valid");
        Ok(claims)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::BadSignature,
        _ => AuthError::MalformedToken,
    }
}
