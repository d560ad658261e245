//! Error types for the authentication gate.
//!
//! Every per-request failure collapses to one externally observable outcome
//! (HTTP 401 with a fixed body) so that a caller probing the gate cannot
//! learn which internal check rejected the token. The variants exist for
//! logging and diagnostics only.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Result type alias for the authentication gate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// The single outward-facing message for every denied request.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized. The JWT is missing, invalid, or expired";

/// Authentication gate errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Configuration error (fatal, at construction).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-set fetch from the identity provider failed.
    #[error("Key-set fetch failed: {0}")]
    KeySetFetch(String),

    /// A published key's material could not be turned into a usable key.
    #[error("Unusable key material for kid {kid}: {reason}")]
    KeyDecode {
        /// Key identifier of the offending entry.
        kid: String,
        /// What made the entry unusable.
        reason: String,
    },

    /// The Authorization header is missing or not a `Bearer <token>` shape.
    #[error("Missing or malformed bearer credentials")]
    MissingCredentials,

    /// The token could not be parsed as a JWT, or a required claim is absent.
    #[error("Malformed token")]
    MalformedToken,

    /// The token declares a signing algorithm other than the one accepted.
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The token's `kid` is not in the provider's key-set, even after refresh.
    #[error("Unknown key ID: {0}")]
    UnknownKey(String),

    /// Signature verification failed.
    #[error("Bad token signature")]
    BadSignature,

    /// The token's `iss` claim does not equal the configured issuer.
    #[error("Issuer mismatch: expected {expected}, got {actual}")]
    IssuerMismatch {
        /// Expected issuer URL.
        expected: String,
        /// Issuer URL found in the token.
        actual: String,
    },

    /// The token is past its expiry.
    #[error("Token expired")]
    Expired,

    /// The provider reports the token's session as no longer active.
    #[error("Session revoked (userinfo returned {0})")]
    SessionRevoked(u16),

    /// The provider could not be reached for the session check.
    #[error("Identity provider unreachable: {0}")]
    ProviderUnreachable(String),

    /// The token's subject does not map to any local identity record.
    #[error("No local identity for subject")]
    IdentityNotFound,

    /// The injected identity lookup failed (infrastructure error).
    #[error("Identity lookup failed: {0}")]
    LookupFailed(String),
}

impl AuthError {
    /// Whether this error denies a single request (as opposed to the
    /// construction-time failures that must prevent the service from
    /// accepting traffic at all).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

impl IntoResponse for AuthError {
    /// Uniform 401 regardless of which internal stage failed.
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [("WWW-Authenticate", "Bearer")],
            Json(json!({ "error": UNAUTHORIZED_MESSAGE })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_request_errors_are_unauthorized() {
        assert!(AuthError::MalformedToken.is_unauthorized());
        assert!(AuthError::SessionRevoked(401).is_unauthorized());
        assert!(AuthError::IdentityNotFound.is_unauthorized());
        assert!(!AuthError::Config("empty realm".into()).is_unauthorized());
    }

    #[test]
    fn every_variant_collapses_to_401() {
        let variants = [
            AuthError::MissingCredentials,
            AuthError::MalformedToken,
            AuthError::UnsupportedAlgorithm("HS256".into()),
            AuthError::UnknownKey("k9".into()),
            AuthError::BadSignature,
            AuthError::IssuerMismatch {
                expected: "a".into(),
                actual: "b".into(),
            },
            AuthError::Expired,
            AuthError::SessionRevoked(403),
            AuthError::IdentityNotFound,
        ];
        for err in variants {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
