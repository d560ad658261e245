//! Key material decoding — the provider's published key-set document and
//! the conversion of its RSA entries into verification keys.
//!
//! Pure and stateless: one [`Jwk`] in, one [`DecodingKey`] (or a decode
//! failure) out. Skipping non-RSA entries is the caller's job.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};

use crate::{AuthError, Result};

/// A single key from the provider's key-set endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key identifier, matched against the `kid` in token headers.
    pub kid: String,
    /// Key type (`"RSA"` entries are the only ones consumed).
    pub kty: String,
    /// Declared algorithm, informational here.
    #[serde(default)]
    pub alg: Option<String>,
    /// Intended use (`"sig"`), informational here.
    #[serde(default, rename = "use")]
    pub use_: Option<String>,
    /// RSA modulus, base64url-encoded big-endian.
    #[serde(default)]
    pub n: String,
    /// RSA public exponent, base64url-encoded big-endian.
    #[serde(default)]
    pub e: String,
    /// X.509 certificate chain the provider publishes alongside the raw
    /// components; not consumed by validation.
    #[serde(default)]
    pub x5c: Vec<String>,
}

/// The key-set endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwkSet {
    /// Published keys.
    pub keys: Vec<Jwk>,
}

/// Convert an RSA [`Jwk`] into a verification key.
///
/// Deterministic: the same modulus and exponent always yield an equivalent
/// key. Rejects components that are not valid base64url or that decode to
/// nothing (a zero-length exponent is not a usable key).
pub fn decode_rsa_key(jwk: &Jwk) -> Result<DecodingKey> {
    let n = URL_SAFE_NO_PAD.decode(&jwk.n).map_err(|e| AuthError::KeyDecode {
        kid: jwk.kid.clone(),
        reason: format!("modulus is not valid base64url: {e}"),
    })?;
    let e = URL_SAFE_NO_PAD.decode(&jwk.e).map_err(|e| AuthError::KeyDecode {
        kid: jwk.kid.clone(),
        reason: format!("exponent is not valid base64url: {e}"),
    })?;
    if n.is_empty() || e.is_empty() {
        return Err(AuthError::KeyDecode {
            kid: jwk.kid.clone(),
            reason: "zero-length modulus or exponent".to_string(),
        });
    }

    DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| AuthError::KeyDecode {
        kid: jwk.kid.clone(),
        reason: e.to_string(),
    })
}
