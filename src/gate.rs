//! Authentication gate — orchestrates token extraction, signature
//! validation, session liveness, and identity resolution.
//!
//! The pipeline order is fixed: extract → verify → liveness → resolve.
//! Any stage's failure short-circuits the rest; identity is never resolved
//! for a token that failed signature or liveness checks. Middleware
//! collapses every failure to one uniform 401.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::identity::{AuthContext, IdentityLookup, IdentityResolver};
use crate::key_cache::KeyCache;
use crate::session::SessionChecker;
use crate::verifier::TokenVerifier;
use crate::{AuthError, Result};

/// The bearer-token authentication gate.
pub struct AuthGate {
    verifier: TokenVerifier,
    session: SessionChecker,
    resolver: IdentityResolver,
}

impl AuthGate {
    /// Construct the gate: validate configuration, build the provider HTTP
    /// client, and perform the initial key-set fetch.
    ///
    /// # Errors
    ///
    /// Any error here is fatal — the service must not accept traffic
    /// without complete configuration and initial trust material.
    pub async fn new(config: &Config, lookup: Arc<dyn IdentityLookup>) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AuthError::Config(format!("failed to build HTTP client: {e}")))?;

        let keys = Arc::new(
            KeyCache::bootstrap(config.certs_url(), http.clone(), config.key_cache_ttl).await?,
        );

        Ok(Self {
            verifier: TokenVerifier::new(keys, config.issuer()),
            session: SessionChecker::new(http, config.userinfo_url()),
            resolver: IdentityResolver::new(lookup),
        })
    }

    /// Extract the token from an `Authorization` header value.
    ///
    /// Accepts exactly `Bearer <token>` (scheme case-insensitive, single
    /// space, non-empty token).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] for anything else.
    pub fn extract_bearer_token(header_value: &str) -> Result<&str> {
        let mut parts = header_value.splitn(2, ' ');
        let scheme = parts.next().unwrap_or_default();
        let token = parts.next().unwrap_or_default();

        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
            return Err(AuthError::MissingCredentials);
        }
        Ok(token)
    }

    /// Authenticate a request from its `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns the first stage's failure; callers exposed to the network
    /// must surface all of them identically (the [`AuthError`]
    /// `IntoResponse` impl does exactly that).
    pub async fn authenticate(&self, authorization: &str) -> Result<AuthContext> {
        let token = Self::extract_bearer_token(authorization)?;
        let claims = self.verifier.verify(token).await?;
        self.session.check(token).await?;
        let identity_id = self.resolver.resolve(&claims).await?;

        Ok(AuthContext {
            identity_id,
            claims,
        })
    }
}

/// Authentication middleware.
///
/// On success, inserts the [`AuthContext`] into the request extensions for
/// downstream handlers. On any failure, responds with the uniform 401 —
/// the internal stage that rejected the request is logged, never exposed.
pub async fn require_auth(
    State(gate): State<Arc<AuthGate>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match gate.authenticate(authorization).await {
        Ok(context) => {
            debug!(
                identity = %context.identity_id,
                subject = %context.claims.sub,
                "Authenticated request"
            );
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(err) => {
            warn!(path = %request.uri().path(), error = %err, "Authentication denied");
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_well_formed_bearer_header() {
        assert_eq!(
            AuthGate::extract_bearer_token("Bearer abc.def.ghi").unwrap(),
            "abc.def.ghi"
        );
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(AuthGate::extract_bearer_token("bearer tok").unwrap(), "tok");
        assert_eq!(AuthGate::extract_bearer_token("BEARER tok").unwrap(), "tok");
    }

    #[test]
    fn rejects_missing_header() {
        assert!(matches!(
            AuthGate::extract_bearer_token(""),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn rejects_wrong_scheme() {
        assert!(AuthGate::extract_bearer_token("Basic dXNlcjpwdw==").is_err());
        assert!(AuthGate::extract_bearer_token("Token abc").is_err());
    }

    #[test]
    fn rejects_scheme_without_token() {
        assert!(AuthGate::extract_bearer_token("Bearer").is_err());
        assert!(AuthGate::extract_bearer_token("Bearer ").is_err());
    }

    #[test]
    fn rejects_extra_parts() {
        assert!(AuthGate::extract_bearer_token("Bearer abc def").is_err());
    }
}
