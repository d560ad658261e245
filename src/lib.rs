//! Bearer-token authentication gate for OpenID Connect identity providers.
//!
//! Verifies that an inbound request carries a signature-valid, non-expired,
//! correctly-issued token from a trusted provider, that the underlying
//! session has not been revoked server-side, and that the token's subject
//! maps to a known local identity record.
//!
//! # Pipeline
//!
//! 1. Extract the `Bearer <token>` credential from the Authorization header.
//! 2. Verify the token's RS256 signature against the provider's published
//!    key-set (cached, lazily refreshed).
//! 3. Confirm session liveness via the provider's user-info endpoint.
//! 4. Resolve the claims to a local identity through an injected lookup.
//!
//! Any stage's failure short-circuits the rest and collapses to a uniform
//! 401 at the HTTP boundary. See [`AuthGate`] and [`require_auth`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod jwks;
pub mod key_cache;
pub mod session;
pub mod verifier;

pub use config::Config;
pub use error::{AuthError, Result, UNAUTHORIZED_MESSAGE};
pub use gate::{AuthGate, require_auth};
pub use identity::{AuthContext, IdentityLookup};
pub use verifier::Claims;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
