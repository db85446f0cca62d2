//! Authenticated-principal sessions.
//!
//! Sessions are opaque records keyed by a random token delivered in a signed
//! cookie. The store is a trait so the gateway can be handed any keyed backend;
//! [`MemorySessionStore`] is the in-process implementation used by the server.

mod cookie;

pub use cookie::{generate_token, CookieSigner, OAUTH_STATE_COOKIE};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Profile of the signed-in user, taken verbatim from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Storage(String),
}

/// Keyed session persistence. Keys are session tokens; expiry is the store's concern.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a live session. Expired or unknown keys yield `None`.
    async fn get(&self, key: &str) -> Result<Option<Principal>, SessionError>;

    /// Open (or replace) the session for `key`.
    async fn set(&self, key: &str, principal: Principal) -> Result<(), SessionError>;

    /// Destroy the session for `key`. Unknown keys are not an error.
    async fn destroy(&self, key: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Clone)]
struct SessionEntry {
    principal: Principal,
    expires_at: Instant,
}

/// In-memory session store with a fixed TTL per session
#[derive(Debug)]
pub struct MemorySessionStore {
    entries: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Drop every session whose TTL has elapsed
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of tracked sessions, expired ones included until the next sweep
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<Principal>, SessionError> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.principal.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        // Read guard is released above; evict the stale entry
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, principal: Principal) -> Result<(), SessionError> {
        let expires_at = Instant::now()
            .checked_add(self.ttl)
            .ok_or_else(|| SessionError::Storage("Session TTL is out of range".to_string()))?;
        self.entries.insert(
            key.to_string(),
            SessionEntry {
                principal,
                expires_at,
            },
        );
        Ok(())
    }

    async fn destroy(&self, key: &str) -> Result<(), SessionError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Spawn a background task that periodically purges expired sessions
pub fn spawn_cleanup_task(store: Arc<MemorySessionStore>, cleanup_interval_secs: u64) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(cleanup_interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            store.cleanup_expired();
            tracing::debug!(remaining = store.len(), "Session cleanup complete");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            id: "10769150350006150715113082367".to_string(),
            display_name: "Ada Lovelace".to_string(),
            email: Some("ada@example.com".to_string()),
            photo: None,
        }
    }

    #[test]
    fn test_principal_serializes_camel_case() {
        let json = serde_json::to_value(principal()).unwrap();
        assert_eq!(json["displayName"], "Ada Lovelace");
        assert_eq!(json["email"], "ada@example.com");
        assert!(json["photo"].is_null());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.set("token", principal()).await.unwrap();

        let found = store.get("token").await.unwrap();
        assert_eq!(found, Some(principal()));
    }

    #[tokio::test]
    async fn test_unknown_key_is_none() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destroy_removes_session() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.set("token", principal()).await.unwrap();
        store.destroy("token").await.unwrap();

        assert!(store.get("token").await.unwrap().is_none());
        // Destroying twice is fine
        assert!(store.destroy("token").await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_session_is_invisible_and_evicted() {
        let store = MemorySessionStore::new(Duration::ZERO);
        store.set("token", principal()).await.unwrap();

        assert!(store.get("token").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_is_an_error() {
        let store = MemorySessionStore::new(Duration::from_secs(u64::MAX));
        let result = store.set("token", principal()).await;

        assert!(matches!(result, Err(SessionError::Storage(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_expired_keeps_live_sessions() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.set("a", principal()).await.unwrap();
        store.set("b", principal()).await.unwrap();

        store.cleanup_expired();
        assert_eq!(store.len(), 2);
    }
}
