//! Session token store
//!
//! A thin layer over a key-value backend. Every session owns its own
//! `state` nonce and `access_token`; a pending-state record maps an issued
//! nonce back to the session so the OAuth callback (which carries no session
//! header) lands in the right place.

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Session used when a request carries no session id
pub const DEFAULT_SESSION: &str = "default";

/// Minimal key-value contract the token store needs
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-process backend, lost on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Snapshot of everything stored for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub state: Option<String>,
    pub access_token: Option<String>,
    pub login: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PendingState {
    session: String,
    issued_at: i64,
}

fn session_key(session: &str, field: &str) -> String {
    format!("session:{}:{}", session, field)
}

fn pending_key(state: &str) -> String {
    format!("oauth_state:{}", state)
}

/// Per-session OAuth state and token storage
#[derive(Clone)]
pub struct TokenStore {
    kv: Arc<dyn KeyValueStore>,
    state_ttl: Option<Duration>,
}

impl TokenStore {
    /// `state_ttl` of `None` keeps issued states valid forever
    pub fn new(kv: Arc<dyn KeyValueStore>, state_ttl: Option<Duration>) -> Self {
        Self { kv, state_ttl }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), None)
    }

    /// Record a freshly issued nonce for `session`, retiring the previous one
    pub async fn set_state(&self, session: &str, state: &str) -> Result<()> {
        if let Some(previous) = self.get_state(session).await? {
            self.kv.delete(&pending_key(&previous)).await?;
        }

        let pending = PendingState {
            session: session.to_string(),
            issued_at: chrono::Utc::now().timestamp(),
        };
        self.kv.set(&session_key(session, "state"), state).await?;
        self.kv.set(&pending_key(state), &serde_json::to_string(&pending)?).await?;
        Ok(())
    }

    pub async fn get_state(&self, session: &str) -> Result<Option<String>> {
        self.kv.get(&session_key(session, "state")).await
    }

    /// Match a callback's `state` against the issued nonces.
    ///
    /// Returns the owning session and consumes the nonce. Unknown, expired,
    /// or superseded nonces are rejected with [`Error::InvalidState`].
    pub async fn verify_state(&self, received: &str) -> Result<String> {
        if received.is_empty() {
            return Err(Error::InvalidState);
        }

        let Some(raw) = self.kv.get(&pending_key(received)).await? else {
            return Err(Error::InvalidState);
        };
        let pending: PendingState = serde_json::from_str(&raw)?;

        if let Some(ttl) = self.state_ttl {
            let age = chrono::Utc::now().timestamp() - pending.issued_at;
            if age < 0 || age as u64 > ttl.as_secs() {
                self.kv.delete(&pending_key(received)).await?;
                return Err(Error::InvalidState);
            }
        }

        let stored = self.get_state(&pending.session).await?;
        if stored.as_deref() != Some(received) {
            return Err(Error::InvalidState);
        }

        self.kv.delete(&pending_key(received)).await?;
        self.kv.delete(&session_key(&pending.session, "state")).await?;
        Ok(pending.session)
    }

    pub async fn set_access_token(&self, session: &str, access_token: &str) -> Result<()> {
        self.kv.set(&session_key(session, "access_token"), access_token).await
    }

    pub async fn get_access_token(&self, session: &str) -> Result<Option<String>> {
        self.kv.get(&session_key(session, "access_token")).await
    }

    pub async fn set_login(&self, session: &str, login: &str) -> Result<()> {
        self.kv.set(&session_key(session, "login"), login).await
    }

    pub async fn session(&self, session: &str) -> Result<SessionRecord> {
        Ok(SessionRecord {
            state: self.get_state(session).await?,
            access_token: self.get_access_token(session).await?,
            login: self.kv.get(&session_key(session, "login")).await?,
        })
    }

    /// The session's token, or [`Error::AuthMissing`]
    pub async fn check_access_token(&self, session: &str) -> Result<String> {
        self.get_access_token(session).await?.ok_or(Error::AuthMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_auth_error() {
        let store = TokenStore::in_memory();
        let err = store.check_access_token(DEFAULT_SESSION).await.unwrap_err();
        assert!(matches!(err, Error::AuthMissing));
        assert_eq!(err.to_string(), "User access token not found");
    }

    #[tokio::test]
    async fn test_token_roundtrip_is_per_session() {
        let store = TokenStore::in_memory();
        store.set_access_token("alice", "tok-a").await.unwrap();

        assert_eq!(store.check_access_token("alice").await.unwrap(), "tok-a");
        assert!(store.check_access_token("bob").await.is_err());
    }

    #[tokio::test]
    async fn test_verify_state_returns_session_once() {
        let store = TokenStore::in_memory();
        store.set_state("alice", "nonce-1").await.unwrap();

        assert_eq!(store.verify_state("nonce-1").await.unwrap(), "alice");
        assert!(matches!(store.verify_state("nonce-1").await, Err(Error::InvalidState)));
        assert_eq!(store.get_state("alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_verify_state_rejects_unknown_and_empty() {
        let store = TokenStore::in_memory();
        store.set_state("alice", "nonce-1").await.unwrap();

        assert!(matches!(store.verify_state("other").await, Err(Error::InvalidState)));
        assert!(matches!(store.verify_state("").await, Err(Error::InvalidState)));
    }

    #[tokio::test]
    async fn test_superseded_state_is_rejected() {
        let store = TokenStore::in_memory();
        store.set_state("alice", "first").await.unwrap();
        store.set_state("alice", "second").await.unwrap();

        assert!(matches!(store.verify_state("first").await, Err(Error::InvalidState)));
        assert_eq!(store.verify_state("second").await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_reissued_state_drops_previous_pending_record() {
        let kv = Arc::new(MemoryStore::new());
        let store = TokenStore::new(kv.clone(), Some(Duration::from_secs(600)));

        for i in 0..50 {
            store.set_state("alice", &format!("n{}", i)).await.unwrap();
        }

        assert_eq!(kv.get("oauth_state:n0").await.unwrap(), None);
        assert_eq!(kv.get("oauth_state:n48").await.unwrap(), None);
        assert!(kv.get("oauth_state:n49").await.unwrap().is_some());
        assert_eq!(kv.entries.read().await.keys().filter(|k| k.starts_with("oauth_state:")).count(), 1);
    }

    #[tokio::test]
    async fn test_expired_state_is_rejected() {
        let kv = Arc::new(MemoryStore::new());
        let store = TokenStore::new(kv.clone(), Some(Duration::from_secs(60)));

        let stale = PendingState {
            session: "alice".to_string(),
            issued_at: chrono::Utc::now().timestamp() - 120,
        };
        kv.set("session:alice:state", "old").await.unwrap();
        kv.set("oauth_state:old", &serde_json::to_string(&stale).unwrap()).await.unwrap();

        assert!(matches!(store.verify_state("old").await, Err(Error::InvalidState)));
        assert_eq!(kv.get("oauth_state:old").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_record_snapshot() {
        let store = TokenStore::in_memory();
        store.set_state("s", "n").await.unwrap();
        store.set_access_token("s", "t").await.unwrap();
        store.set_login("s", "octocat").await.unwrap();

        let record = store.session("s").await.unwrap();
        assert_eq!(
            record,
            SessionRecord {
                state: Some("n".to_string()),
                access_token: Some("t".to_string()),
                login: Some("octocat".to_string()),
            }
        );
    }
}
