//! Configuration management

use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{AuthError, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity-provider configuration
    pub provider: ProviderConfig,
    /// How long a fetched key-set stays fresh before `get` re-fetches
    #[serde(with = "humantime_serde")]
    pub key_cache_ttl: Duration,
    /// Timeout for outbound calls to the identity provider. These sit on
    /// the request's critical path, so keep it short.
    #[serde(with = "humantime_serde")]
    pub http_timeout: Duration,
}

/// Identity-provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the identity provider (scheme + host, no realm path)
    pub base_url: String,
    /// Realm name (opaque provider-side namespace)
    pub realm: String,
    /// Client identifier registered with the provider
    pub client_id: String,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(AuthError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (AUTH_GATE_ prefix)
        figment = figment.merge(Env::prefixed("AUTH_GATE_").split("__"));

        figment
            .extract()
            .map_err(|e| AuthError::Config(e.to_string()))
    }

    /// Check that the provider settings are complete and usable.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the base URL, realm, or client ID is
    /// empty, or if the base URL does not parse as an absolute URL.
    pub fn validate(&self) -> Result<()> {
        if self.provider.base_url.is_empty()
            || self.provider.realm.is_empty()
            || self.provider.client_id.is_empty()
        {
            return Err(AuthError::Config(
                "provider configuration incomplete: base URL, realm, and client ID are required"
                    .to_string(),
            ));
        }
        Url::parse(&self.provider.base_url)
            .map_err(|e| AuthError::Config(format!("invalid provider base URL: {e}")))?;
        Ok(())
    }

    /// The exact issuer string expected in token `iss` claims.
    #[must_use]
    pub fn issuer(&self) -> String {
        format!(
            "{}/realms/{}",
            self.provider.base_url.trim_end_matches('/'),
            self.provider.realm
        )
    }

    /// URL of the provider's published key-set endpoint.
    #[must_use]
    pub fn certs_url(&self) -> String {
        format!("{}/protocol/openid-connect/certs", self.issuer())
    }

    /// URL of the provider's user-info endpoint (session liveness).
    #[must_use]
    pub fn userinfo_url(&self) -> String {
        format!("{}/protocol/openid-connect/userinfo", self.issuer())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            key_cache_ttl: Duration::from_secs(3600),
            http_timeout: Duration::from_secs(10),
        }
    }
}

/// Human-readable duration serde ("30s", "5m", "100ms")
mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize Duration to human-readable string (e.g., "30s")
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    /// Deserialize human-readable duration string (e.g., "30s", "5m", "1h", "100ms")
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        // "ms" before "s" — both end in 's'
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(serde::de::Error::custom)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(serde::de::Error::custom)
        } else if let Some(hours) = s.strip_suffix('h') {
            hours
                .parse::<u64>()
                .map(|h| Duration::from_secs(h * 3600))
                .map_err(serde::de::Error::custom)
        } else {
            // Assume seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn demo_config() -> Config {
        Config {
            provider: ProviderConfig {
                base_url: "https://idp.example".to_string(),
                realm: "demo".to_string(),
                client_id: "workflow-api".to_string(),
            },
            ..Config::default()
        }
    }

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.key_cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn validate_rejects_empty_provider_fields() {
        let mut config = demo_config();
        config.provider.realm = String::new();
        assert!(config.validate().is_err());

        let mut config = demo_config();
        config.provider.base_url = String::new();
        assert!(config.validate().is_err());

        let mut config = demo_config();
        config.provider.client_id = String::new();
        assert!(config.validate().is_err());

        assert!(demo_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unparsable_base_url() {
        let mut config = demo_config();
        config.provider.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn issuer_and_endpoint_urls() {
        let config = demo_config();
        assert_eq!(config.issuer(), "https://idp.example/realms/demo");
        assert_eq!(
            config.certs_url(),
            "https://idp.example/realms/demo/protocol/openid-connect/certs"
        );
        assert_eq!(
            config.userinfo_url(),
            "https://idp.example/realms/demo/protocol/openid-connect/userinfo"
        );
    }

    #[test]
    fn issuer_normalizes_trailing_slash() {
        let mut config = demo_config();
        config.provider.base_url = "https://idp.example/".to_string();
        assert_eq!(config.issuer(), "https://idp.example/realms/demo");
    }

    #[test]
    fn duration_fields_parse_human_readable_values() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "key_cache_ttl": "5m",
            "http_timeout": "500ms",
        }))
        .unwrap();
        assert_eq!(config.key_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.http_timeout, Duration::from_millis(500));

        let config: Config = serde_json::from_value(serde_json::json!({
            "key_cache_ttl": "2h",
            "http_timeout": "15",
        }))
        .unwrap();
        assert_eq!(config.key_cache_ttl, Duration::from_secs(7200));
        assert_eq!(config.http_timeout, Duration::from_secs(15));
    }
}
