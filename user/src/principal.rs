//! Principal lookup.
//!
//! A validated token only says who the caller claims to be. The resolver
//! confirms that the principal still exists in the store before the
//! authorizer grants anything.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;

/// A known identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            scopes: Vec::new(),
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }
}

/// Storage backend holding principals.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Returns the principal with this username, if any.
    async fn find_principal(&self, username: &str) -> Result<Option<Principal>>;
}

/// Outcome of resolving a claimed username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Recognized(Principal),
    /// Not in the store, or the store answered with a different principal.
    NotAuthorized,
}

impl Resolution {
    pub fn is_recognized(&self) -> bool {
        matches!(self, Resolution::Recognized(_))
    }
}

/// Confirms claimed identities against a [`PrincipalStore`].
#[derive(Clone)]
pub struct PrincipalResolver {
    store: Arc<dyn PrincipalStore>,
}

impl PrincipalResolver {
    pub fn new(store: Arc<dyn PrincipalStore>) -> Self {
        Self { store }
    }

    /// Looks the claimed username up exactly once.
    ///
    /// Store failures are returned as errors; they are not authorization
    /// outcomes.
    pub async fn resolve(&self, claimed_username: &str) -> Result<Resolution> {
        let found = self.store.find_principal(claimed_username).await?;

        let resolution = match found {
            Some(principal) if principal.username == claimed_username => {
                Resolution::Recognized(principal)
            }
            Some(principal) => {
                debug!(
                    claimed = %claimed_username,
                    found = %principal.username,
                    "Store returned a different principal"
                );
                Resolution::NotAuthorized
            }
            None => {
                debug!(claimed = %claimed_username, "Principal not found");
                Resolution::NotAuthorized
            }
        };

        Ok(resolution)
    }
}

/// In-memory store, for tests and local development.
#[derive(Default)]
pub struct MemoryPrincipalStore {
    principals: RwLock<HashMap<String, Principal>>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principals(principals: impl IntoIterator<Item = Principal>) -> Self {
        let map = principals
            .into_iter()
            .map(|p| (p.username.clone(), p))
            .collect();
        Self {
            principals: RwLock::new(map),
        }
    }

    pub async fn insert(&self, principal: Principal) {
        self.principals
            .write()
            .await
            .insert(principal.username.clone(), principal);
    }

    pub async fn remove(&self, username: &str) -> Option<Principal> {
        self.principals.write().await.remove(username)
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn find_principal(&self, username: &str) -> Result<Option<Principal>> {
        Ok(self.principals.read().await.get(username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UserError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that always answers with a fixed principal and counts lookups.
    struct FixedStore {
        answer: Option<Principal>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl PrincipalStore for FixedStore {
        async fn find_principal(&self, _username: &str) -> Result<Option<Principal>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl PrincipalStore for BrokenStore {
        async fn find_principal(&self, _username: &str) -> Result<Option<Principal>> {
            Err(UserError::Store("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_resolve_known_principal() {
        let store = MemoryPrincipalStore::with_principals([Principal::new("alice")]);
        let resolver = PrincipalResolver::new(Arc::new(store));

        let resolution = resolver.resolve("alice").await.unwrap();
        assert_eq!(resolution, Resolution::Recognized(Principal::new("alice")));
    }

    #[tokio::test]
    async fn test_resolve_unknown_principal() {
        let store = MemoryPrincipalStore::with_principals([Principal::new("alice")]);
        let resolver = PrincipalResolver::new(Arc::new(store));

        let resolution = resolver.resolve("mallory").await.unwrap();
        assert_eq!(resolution, Resolution::NotAuthorized);
    }

    #[tokio::test]
    async fn test_mismatched_principal_not_authorized() {
        let store = Arc::new(FixedStore {
            answer: Some(Principal::new("Alice")),
            lookups: AtomicUsize::new(0),
        });
        let resolver = PrincipalResolver::new(store.clone());

        let resolution = resolver.resolve("alice").await.unwrap();
        assert!(!resolution.is_recognized());
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let resolver = PrincipalResolver::new(Arc::new(BrokenStore));
        let result = resolver.resolve("alice").await;
        assert!(matches!(result, Err(UserError::Store(_))));
    }

    #[tokio::test]
    async fn test_memory_store_insert_and_remove() {
        let store = MemoryPrincipalStore::new();
        store
            .insert(Principal::new("bob").with_scopes(vec!["posts:write".into()]))
            .await;

        let found = store.find_principal("bob").await.unwrap().unwrap();
        assert_eq!(found.scopes, vec!["posts:write".to_string()]);

        assert!(store.remove("bob").await.is_some());
        assert!(store.find_principal("bob").await.unwrap().is_none());
    }
}
