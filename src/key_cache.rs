//! Key cache — the gate's only shared mutable state.
//!
//! Holds the current set of trusted verification keys indexed by `kid`,
//! refreshed lazily from the provider's key-set endpoint. Readers take a
//! shared lock on an immutable snapshot; a refresh performs the network
//! fetch with no lock held and swaps a complete replacement snapshot in
//! under the write lock, so slow provider I/O never blocks concurrent
//! lookups.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::jwks::{JwkSet, decode_rsa_key};
use crate::{AuthError, Result};

struct KeySnapshot {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

/// Cache of the provider's published verification keys.
pub struct KeyCache {
    snapshot: RwLock<KeySnapshot>,
    http: reqwest::Client,
    certs_url: String,
    ttl: Duration,
}

impl KeyCache {
    /// Create the cache and perform the initial key-set fetch.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeySetFetch`] if the initial fetch fails — the
    /// service must not start without any trust material.
    pub async fn bootstrap(
        certs_url: String,
        http: reqwest::Client,
        ttl: Duration,
    ) -> Result<Self> {
        let cache = Self {
            snapshot: RwLock::new(KeySnapshot {
                keys: HashMap::new(),
                fetched_at: Instant::now(),
            }),
            http,
            certs_url,
            ttl,
        };
        cache.refresh().await?;
        Ok(cache)
    }

    /// Look up the verification key for `kid`.
    ///
    /// Serves straight from the snapshot when the key is present and the
    /// last fetch is within the freshness window. Otherwise refreshes once
    /// and re-checks; a `kid` still absent after that refresh is
    /// [`AuthError::UnknownKey`]. Never more than one refresh per call.
    pub async fn get(&self, kid: &str) -> Result<DecodingKey> {
        {
            let snapshot = self.snapshot.read();
            if snapshot.fetched_at.elapsed() < self.ttl {
                if let Some(key) = snapshot.keys.get(kid) {
                    return Ok(key.clone());
                }
            }
        }

        debug!(kid = %kid, "Key missing or snapshot stale, refreshing key-set");
        self.refresh().await?;

        let snapshot = self.snapshot.read();
        snapshot
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    /// Fetch the key-set and swap in a fresh snapshot.
    ///
    /// Decodes every RSA entry; an entry that fails to decode is logged and
    /// skipped, never fatal for the rest. The swap replaces the whole map,
    /// so keys the provider stopped advertising are purged on the next
    /// successful refresh — callers that already cloned a key finish their
    /// request with it, which covers provider-side rotation races.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeySetFetch`] on transport failure, a non-2xx
    /// status, or an unparsable document. The previous snapshot is kept.
    pub async fn refresh(&self) -> Result<()> {
        let response = self
            .http
            .get(&self.certs_url)
            .send()
            .await
            .map_err(|e| AuthError::KeySetFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySetFetch(format!(
                "key-set endpoint returned HTTP {}",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeySetFetch(e.to_string()))?;

        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            if jwk.kty != "RSA" {
                continue;
            }
            match decode_rsa_key(jwk) {
                Ok(key) => {
                    keys.insert(jwk.kid.clone(), key);
                }
                Err(e) => {
                    warn!(kid = %jwk.kid, error = %e, "Skipping undecodable key-set entry");
                }
            }
        }

        debug!(count = keys.len(), "Key-set refreshed");
        *self.snapshot.write() = KeySnapshot {
            keys,
            fetched_at: Instant::now(),
        };
        Ok(())
    }

    /// Number of keys in the current snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.read().keys.len()
    }

    /// Whether the current snapshot holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
