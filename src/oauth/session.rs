//! In-memory OAuth state and session stores.
//!
//! Both stores are shared across requests behind `tokio` locks, bounded in
//! size and time-limited. Session tokens are opaque to clients; the map is
//! keyed by their SHA-256 digest so raw tokens are never held at rest.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use super::client::{AccessibleResource, TokenResponse};

/// Grace period so a token is refreshed slightly before Atlassian rejects it.
const EXPIRY_SKEW_SECS: i64 = 30;

/// Upper bound for any lifetime taken from config or a token response.
const MAX_TTL_SECS: i64 = 365 * 24 * 3600;

fn ttl(secs: i64) -> Duration {
    Duration::seconds(secs.clamp(0, MAX_TTL_SECS))
}

fn ttl_from_config(secs: u64) -> Duration {
    ttl(i64::try_from(secs).unwrap_or(MAX_TTL_SECS))
}

fn token_ttl(token: &TokenResponse, default_ttl_secs: u64) -> Duration {
    match token.expires_in {
        Some(secs) => ttl(secs),
        None => ttl_from_config(default_ttl_secs),
    }
}

fn digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

// =============================================================================
// Pending authorization state
// =============================================================================

#[derive(Debug, Clone)]
pub struct PendingState {
    pub created_at: DateTime<Utc>,
    /// Optional site hint carried from `/oauth/login?site=` to the callback.
    pub site: Option<String>,
}

/// Single-use CSRF `state` values awaiting the OAuth callback.
#[derive(Debug)]
pub struct StateStore {
    pending: Mutex<HashMap<String, PendingState>>,
    ttl: Duration,
    capacity: usize,
}

impl StateStore {
    pub fn new(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl: ttl_from_config(ttl_secs),
            capacity: capacity.max(1),
        }
    }

    pub async fn issue(&self, site: Option<String>) -> String {
        let state = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let mut pending = self.pending.lock().await;

        if pending.len() >= self.capacity {
            let ttl = self.ttl;
            pending.retain(|_, p| now - p.created_at < ttl);
        }
        if pending.len() >= self.capacity {
            if let Some(oldest) = pending
                .iter()
                .min_by_key(|(_, p)| p.created_at)
                .map(|(k, _)| k.clone())
            {
                pending.remove(&oldest);
            }
        }

        pending.insert(state.clone(), PendingState { created_at: now, site });
        state
    }

    /// Remove and return the state if it exists and has not expired.
    pub async fn consume(&self, state: &str) -> Option<PendingState> {
        let entry = self.pending.lock().await.remove(state)?;
        if Utc::now() - entry.created_at < self.ttl {
            Some(entry)
        } else {
            tracing::debug!("OAuth state expired before callback");
            None
        }
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let ttl = self.ttl;
        let mut pending = self.pending.lock().await;
        let before = pending.len();
        pending.retain(|_, p| now - p.created_at < ttl);
        before - pending.len()
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// A per-user Jira session obtained through the OAuth callback.
#[derive(Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub cloud_id: String,
    pub site_url: String,
    pub site_name: String,
    pub account_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cloud_id", &self.cloud_id)
            .field("site_url", &self.site_url)
            .field("account_id", &self.account_id)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn from_token(token: &TokenResponse, resource: &AccessibleResource, default_ttl_secs: u64) -> Self {
        let now = Utc::now();
        Self {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            cloud_id: resource.id.clone(),
            site_url: resource.url.clone(),
            site_name: resource.name.clone(),
            account_id: None,
            created_at: now,
            expires_at: now + token_ttl(token, default_ttl_secs),
        }
    }

    /// Fold a refresh response into the session. Atlassian rotates refresh
    /// tokens, but keep the old one if the response omits it.
    pub fn apply_refresh(&mut self, token: &TokenResponse, default_ttl_secs: u64) {
        self.access_token = token.access_token.clone();
        if token.refresh_token.is_some() {
            self.refresh_token = token.refresh_token.clone();
        }
        self.expires_at = Utc::now() + token_ttl(token, default_ttl_secs);
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            cloud_id: self.cloud_id.clone(),
            site_url: self.site_url.clone(),
            site_name: self.site_name.clone(),
            account_id: self.account_id.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            refreshable: self.refresh_token.is_some(),
        }
    }
}

/// Client-facing view of a session; never contains tokens.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub cloud_id: String,
    pub site_url: String,
    pub site_name: String,
    pub account_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub refreshable: bool,
}

/// Bounded, synchronized session map.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    max_sessions: usize,
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Serializes refreshes of one session. Refresh tokens rotate, so two
    /// concurrent refreshes of the same session would invalidate each other;
    /// refreshes of different sessions proceed independently.
    pub async fn lock_refresh(&self, token: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.refresh_locks.lock().await;
            // Only the map holds an unused lock.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(digest(token)).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Store a session and return the opaque token handed to the client.
    pub async fn insert(&self, session: Session) -> String {
        let token = new_token();
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= self.max_sessions {
            // Expired sessions with a refresh token could still be revived, but
            // under pressure they go first.
            sessions.retain(|_, s| !s.is_expired_at(now));
        }
        if sessions.len() >= self.max_sessions {
            if let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, s)| s.created_at)
                .map(|(k, _)| k.clone())
            {
                sessions.remove(&oldest);
                tracing::info!("session store full; evicted oldest session");
            }
        }

        sessions.insert(digest(&token), session);
        token
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(&digest(token)).cloned()
    }

    /// Overwrite an existing session; returns `false` if it was removed meanwhile.
    pub async fn replace(&self, token: &str, session: Session) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&digest(token)) {
            Some(slot) => {
                *slot = session;
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, token: &str) -> bool {
        self.sessions.write().await.remove(&digest(token)).is_some()
    }

    /// Drop expired sessions that cannot be refreshed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now) || s.refresh_token.is_some());
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(created_offset_secs: i64, ttl_secs: i64, refreshable: bool) -> Session {
        let created_at = Utc::now() + Duration::seconds(created_offset_secs);
        Session {
            access_token: "access".to_string(),
            refresh_token: refreshable.then(|| "refresh".to_string()),
            cloud_id: "cloud-1".to_string(),
            site_url: "https://acme.atlassian.net".to_string(),
            site_name: "acme".to_string(),
            account_id: None,
            created_at,
            expires_at: created_at + Duration::seconds(ttl_secs),
        }
    }

    #[tokio::test]
    async fn insert_get_remove_roundtrip() {
        let store = SessionStore::new(10);
        let token = store.insert(session(0, 3600, false)).await;

        assert_eq!(store.get(&token).await.unwrap().cloud_id, "cloud-1");
        assert!(store.get("unknown").await.is_none());
        assert!(store.remove(&token).await);
        assert!(!store.remove(&token).await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn raw_tokens_are_not_map_keys() {
        let store = SessionStore::new(10);
        let token = store.insert(session(0, 3600, false)).await;
        let sessions = store.sessions.read().await;
        assert!(!sessions.contains_key(&token));
        assert!(sessions.contains_key(&digest(&token)));
    }

    #[tokio::test]
    async fn full_store_evicts_expired_first_then_oldest() {
        let store = SessionStore::new(2);
        let expired = store.insert(session(-7200, 60, false)).await;
        let older = store.insert(session(-100, 3600, false)).await;

        let third = store.insert(session(0, 3600, false)).await;
        assert!(store.get(&expired).await.is_none());
        assert!(store.get(&older).await.is_some());

        let fourth = store.insert(session(0, 3600, false)).await;
        assert!(store.get(&older).await.is_none());
        assert!(store.get(&third).await.is_some());
        assert!(store.get(&fourth).await.is_some());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn purge_keeps_refreshable_sessions() {
        let store = SessionStore::new(10);
        let dead = store.insert(session(-7200, 60, false)).await;
        let revivable = store.insert(session(-7200, 60, true)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert!(store.get(&dead).await.is_none());
        assert!(store.get(&revivable).await.is_some());
    }

    #[test]
    fn expiry_includes_skew() {
        let s = session(0, 10, false);
        assert!(s.is_expired());
        let s = session(0, 3600, false);
        assert!(!s.is_expired());
    }

    #[test]
    fn refresh_keeps_previous_refresh_token_when_omitted() {
        let mut s = session(-7200, 60, true);
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "new-access",
            "expires_in": 3600
        }))
        .unwrap();

        s.apply_refresh(&token, 3600);
        assert_eq!(s.access_token, "new-access");
        assert_eq!(s.refresh_token.as_deref(), Some("refresh"));
        assert!(!s.is_expired());
    }

    #[test]
    fn out_of_range_expiry_is_clamped() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "expires_in": i64::MAX
        }))
        .unwrap();
        let resource = AccessibleResource {
            id: "cloud-1".to_string(),
            name: "acme".to_string(),
            url: "https://acme.atlassian.net".to_string(),
            scopes: Vec::new(),
            avatar_url: None,
        };

        let s = Session::from_token(&token, &resource, u64::MAX);
        assert_eq!(s.expires_at - s.created_at, Duration::seconds(MAX_TTL_SECS));

        let negative: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "b",
            "expires_in": -5
        }))
        .unwrap();
        let mut s = Session::from_token(&negative, &resource, 3600);
        assert!(s.is_expired());

        let no_expiry: TokenResponse = serde_json::from_value(serde_json::json!({ "access_token": "c" })).unwrap();
        s.apply_refresh(&no_expiry, u64::MAX);
        assert!(!s.is_expired());

        let store = StateStore::new(u64::MAX, 10);
        assert_eq!(store.ttl, Duration::seconds(MAX_TTL_SECS));
    }

    #[tokio::test]
    async fn refresh_locks_are_per_session() {
        let store = SessionStore::new(10);
        let first = store.lock_refresh("token-a").await;

        // A different session is not blocked by the held lock.
        let other = tokio::time::timeout(std::time::Duration::from_millis(200), store.lock_refresh("token-b")).await;
        assert!(other.is_ok());

        // The same session waits until the first refresh finishes.
        let same = tokio::time::timeout(std::time::Duration::from_millis(50), store.lock_refresh("token-a")).await;
        assert!(same.is_err());

        drop(first);
        let same = tokio::time::timeout(std::time::Duration::from_millis(200), store.lock_refresh("token-a")).await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn state_is_single_use() {
        let store = StateStore::new(600, 10);
        let state = store.issue(Some("acme".to_string())).await;

        let pending = store.consume(&state).await.unwrap();
        assert_eq!(pending.site.as_deref(), Some("acme"));
        assert!(store.consume(&state).await.is_none());
        assert!(store.consume("forged").await.is_none());
    }

    #[tokio::test]
    async fn expired_state_is_rejected() {
        let store = StateStore::new(0, 10);
        let state = store.issue(None).await;
        assert!(store.consume(&state).await.is_none());
    }

    #[tokio::test]
    async fn state_store_is_bounded() {
        let store = StateStore::new(600, 2);
        let first = store.issue(None).await;
        store.issue(None).await;
        store.issue(None).await;
        assert_eq!(store.len().await, 2);
        assert!(store.consume(&first).await.is_none());
    }
}
