//! Identity resolver — maps validated token claims to a local identity
//! record via an injected lookup capability.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::verifier::Claims;
use crate::{AuthError, Result};

/// Lookup capability provided by the persistence layer.
///
/// A provider-side account may be referenced locally by a vanity alias or
/// by its email address, and neither is guaranteed present for every
/// record, hence the two methods.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Find a local identity by its registered alias.
    async fn find_by_alias(&self, alias: &str) -> anyhow::Result<Option<Uuid>>;

    /// Find a local identity by email address.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Uuid>>;
}

/// The gate's success output: a resolved local identity plus the raw
/// claims, attached to the request context for downstream use.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Local identity record identifier.
    pub identity_id: Uuid,
    /// Claims from the validated token.
    pub claims: Claims,
}

/// Resolves claims to a local identity through an [`IdentityLookup`].
pub struct IdentityResolver {
    lookup: Arc<dyn IdentityLookup>,
}

impl IdentityResolver {
    /// Wrap an injected lookup capability.
    #[must_use]
    pub fn new(lookup: Arc<dyn IdentityLookup>) -> Self {
        Self { lookup }
    }

    /// Resolve claims to a local identity: alias first, email as fallback.
    ///
    /// # Errors
    ///
    /// - [`AuthError::IdentityNotFound`] — neither lookup matched. An
    ///   authenticated-but-unknown subject is a failure, never anonymous.
    /// - [`AuthError::LookupFailed`] — the lookup infrastructure errored.
    pub async fn resolve(&self, claims: &Claims) -> Result<Uuid> {
        if !claims.preferred_username.is_empty() {
            if let Some(id) = self
                .lookup
                .find_by_alias(&claims.preferred_username)
                .await
                .map_err(|e| AuthError::LookupFailed(e.to_string()))?
            {
                return Ok(id);
            }
        }

        if !claims.email.is_empty() {
            if let Some(id) = self
                .lookup
                .find_by_email(&claims.email)
                .await
                .map_err(|e| AuthError::LookupFailed(e.to_string()))?
            {
                return Ok(id);
            }
        }

        Err(AuthError::IdentityNotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct MemoryLookup {
        by_alias: HashMap<String, Uuid>,
        by_email: HashMap<String, Uuid>,
        fail: bool,
    }

    #[async_trait]
    impl IdentityLookup for MemoryLookup {
        async fn find_by_alias(&self, alias: &str) -> anyhow::Result<Option<Uuid>> {
            if self.fail {
                anyhow::bail!("database unavailable");
            }
            Ok(self.by_alias.get(alias).copied())
        }

        async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Uuid>> {
            if self.fail {
                anyhow::bail!("database unavailable");
            }
            Ok(self.by_email.get(email).copied())
        }
    }

    fn claims(username: &str, email: &str) -> Claims {
        serde_json::from_value(serde_json::json!({
            "sub": "user-1",
            "preferred_username": username,
            "email": email,
            "iss": "https://idp.example/realms/demo",
            "exp": 4_102_444_800_u64,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn resolves_by_alias_first() {
        let alias_id = Uuid::new_v4();
        let email_id = Uuid::new_v4();
        let resolver = IdentityResolver::new(Arc::new(MemoryLookup {
            by_alias: HashMap::from([("alice".to_string(), alias_id)]),
            by_email: HashMap::from([("alice@example.com".to_string(), email_id)]),
            fail: false,
        }));

        let id = resolver
            .resolve(&claims("alice", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(id, alias_id);
    }

    #[tokio::test]
    async fn falls_back_to_email() {
        let email_id = Uuid::new_v4();
        let resolver = IdentityResolver::new(Arc::new(MemoryLookup {
            by_alias: HashMap::new(),
            by_email: HashMap::from([("alice@example.com".to_string(), email_id)]),
            fail: false,
        }));

        let id = resolver
            .resolve(&claims("alice", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(id, email_id);
    }

    #[tokio::test]
    async fn unknown_subject_is_not_found() {
        let resolver = IdentityResolver::new(Arc::new(MemoryLookup {
            by_alias: HashMap::new(),
            by_email: HashMap::new(),
            fail: false,
        }));

        let err = resolver
            .resolve(&claims("nobody", "nobody@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::IdentityNotFound));
    }

    #[tokio::test]
    async fn lookup_infrastructure_error_surfaces() {
        let resolver = IdentityResolver::new(Arc::new(MemoryLookup {
            by_alias: HashMap::new(),
            by_email: HashMap::new(),
            fail: true,
        }));

        let err = resolver
            .resolve(&claims("alice", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::LookupFailed(_)));
    }
}
