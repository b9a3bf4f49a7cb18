//! The in-memory session store: TTL + LRU eviction, optional durable backing.

use crate::durable::DurableSessionStore;
use crate::session::Session;
use chrono::Utc;
use rand::Rng;
use scout_errors::ScoutError;
use scout_types::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tunables for [`SessionStore`], drawn from the §4.1 config fields that
/// govern session lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct SessionStoreConfig {
    /// Hard cap on live sessions; the least-recently-active session is
    /// evicted to make room for a new one.
    pub max_sessions: usize,
    /// Sessions idle longer than this are evicted before any other check.
    pub session_timeout_hours: i64,
    /// History is trimmed to `2 * session_max_turns` parts after every turn.
    pub session_max_turns: usize,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self { max_sessions: 100, session_timeout_hours: 24, session_max_turns: 20 }
    }
}

/// TTL/LRU-bounded session store. Cheaply cloneable; the map lives behind an
/// `Arc<RwLock<_>>` so clones share state.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    config: SessionStoreConfig,
    durable: Option<Arc<dyn DurableSessionStore>>,
}

impl SessionStore {
    /// Build an empty store, optionally backed by durable persistence.
    pub fn new(config: SessionStoreConfig, durable: Option<Arc<dyn DurableSessionStore>>) -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())), config, durable }
    }

    /// Create a new session, evicting timed-out and (if still at capacity)
    /// least-recently-active sessions first.
    pub async fn create(&self, content_ref: impl Into<String>, title: impl Into<String>, model_key: impl Into<String>) -> Session {
        let mut sessions = self.sessions.write().await;
        evict_expired(&mut sessions, self.config.session_timeout_hours);
        if sessions.len() >= self.config.max_sessions {
            evict_lru(&mut sessions);
        }
        let now = Utc::now();
        let session = Session {
            id: generate_session_id(),
            content_ref: content_ref.into(),
            title: title.into(),
            history: Vec::new(),
            created_at: now,
            last_active: now,
            turn_count: 0,
            model_key: model_key.into(),
        };
        sessions.insert(session.id.clone(), session.clone());
        drop(sessions);
        self.persist(&session).await;
        session
    }

    /// Fetch a session, rehydrating from the durable store on a cache miss.
    pub async fn get(&self, id: &SessionId) -> Option<Session> {
        if let Some(session) = self.sessions.read().await.get(id).cloned() {
            return Some(session);
        }
        let durable = self.durable.as_ref()?;
        match durable.load(id).await {
            Ok(Some(session)) => {
                self.sessions.write().await.insert(id.clone(), session.clone());
                Some(session)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, session_id = %id, "failed to rehydrate session from durable store");
                None
            }
        }
    }

    /// Append a completed `(user, model)` turn pair to an existing session,
    /// trimming history to the configured cap and bumping `last_active`.
    pub async fn append_turn(
        &self,
        id: &SessionId,
        user_turn: scout_types::HistoryTurn,
        model_turn: scout_types::HistoryTurn,
    ) -> Result<Session, ScoutError> {
        // Ensure a cache-cold session rehydrates before we take the write lock.
        if self.sessions.read().await.get(id).is_none() {
            self.get(id).await;
        }
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| ScoutError::ApiNotFound(format!("no such session: {id}")))?;
        session.append_turn(user_turn, model_turn, self.config.session_max_turns);
        session.last_active = Utc::now();
        let snapshot = session.clone();
        drop(sessions);
        self.persist(&snapshot).await;
        Ok(snapshot)
    }

    async fn persist(&self, session: &Session) {
        let Some(durable) = &self.durable else { return };
        if let Err(err) = durable.save(session).await {
            tracing::warn!(error = %err, session_id = %session.id, "failed to persist session");
        }
    }
}

fn evict_expired(sessions: &mut HashMap<SessionId, Session>, timeout_hours: i64) {
    let cutoff = Utc::now() - chrono::Duration::hours(timeout_hours);
    sessions.retain(|_, session| session.last_active >= cutoff);
}

fn evict_lru(sessions: &mut HashMap<SessionId, Session>) {
    if let Some(oldest) = sessions.values().min_by_key(|s| s.last_active).map(|s| s.id.clone()) {
        sessions.remove(&oldest);
    }
}

fn generate_session_id() -> SessionId {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let id: String = (0..12).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect();
    SessionId::new(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_types::{HistoryPart, HistoryTurn};

    fn turn(text: &str) -> HistoryTurn {
        HistoryTurn { role: "user".into(), parts: vec![HistoryPart::Text { text: text.into() }] }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = SessionStore::new(SessionStoreConfig::default(), None);
        let session = store.create("vid1", "title", "scout-pro-2").await;
        let fetched = store.get(&session.id).await.unwrap();
        assert_eq!(fetched.content_ref, "vid1");
    }

    #[tokio::test]
    async fn append_turn_updates_history_and_last_active() {
        let store = SessionStore::new(SessionStoreConfig::default(), None);
        let session = store.create("vid1", "title", "scout-pro-2").await;
        let before = session.last_active;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let updated = store.append_turn(&session.id, turn("hi"), turn("hello")).await.unwrap();
        assert_eq!(updated.history.len(), 2);
        assert!(updated.last_active >= before);
    }

    #[tokio::test]
    async fn append_turn_on_missing_session_errors() {
        let store = SessionStore::new(SessionStoreConfig::default(), None);
        let result = store.append_turn(&SessionId::new("ghost"), turn("hi"), turn("hello")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn lru_eviction_makes_room_at_capacity() {
        let config = SessionStoreConfig { max_sessions: 2, session_timeout_hours: 24, session_max_turns: 10 };
        let store = SessionStore::new(config, None);
        let first = store.create("vid1", "t1", "m").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.create("vid2", "t2", "m").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.create("vid3", "t3", "m").await;
        assert!(store.get(&first.id).await.is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_evicted_on_create() {
        let config = SessionStoreConfig { max_sessions: 100, session_timeout_hours: 0, session_max_turns: 10 };
        let store = SessionStore::new(config, None);
        let stale = store.create("vid1", "t1", "m").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.create("vid2", "t2", "m").await;
        assert!(store.get(&stale.id).await.is_none());
    }
}
