//! Session liveness checker.
//!
//! A token can be cryptographically valid yet represent a session the
//! provider has explicitly revoked (logout, administrative force-logout),
//! so signature validity alone never authorizes a request. This check is
//! one authenticated round trip to the provider's user-info endpoint, and
//! it runs only after signature validation has passed — garbage input is
//! never worth a network call.

use reqwest::StatusCode;
use tracing::debug;

use crate::{AuthError, Result};

/// Confirms with the identity provider that a token's session is alive.
pub struct SessionChecker {
    http: reqwest::Client,
    userinfo_url: String,
}

impl SessionChecker {
    /// Create a checker bound to the provider's user-info endpoint.
    #[must_use]
    pub fn new(http: reqwest::Client, userinfo_url: String) -> Self {
        Self { http, userinfo_url }
    }

    /// Check that the session backing `token` has not been revoked.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionRevoked`] — any non-200 response; the session
    ///   is not usable.
    /// - [`AuthError::ProviderUnreachable`] — transport failure or timeout.
    pub async fn check(&self, token: &str) -> Result<()> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnreachable(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(AuthError::SessionRevoked(response.status().as_u16()));
        }

        debug!("Session confirmed alive");
        Ok(())
    }
}
