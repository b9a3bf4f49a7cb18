//! Optional durable persistence backed by a single SQLite database.
//!
//! Mirrors `llama-chat-db`'s pattern: one `bundled` rusqlite connection,
//! WAL journaling, history serialized as JSON text.

use crate::session::Session;
use rusqlite::{params, Connection, OptionalExtension};
use scout_errors::ScoutError;
use scout_types::SessionId;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Durable session persistence. Implementations must tolerate being asked to
/// save a session that was never loaded (first write) and to load a session
/// id that does not exist (returns `None`).
#[async_trait::async_trait]
pub trait DurableSessionStore: Send + Sync {
    /// Upsert a session row.
    async fn save(&self, session: &Session) -> Result<(), ScoutError>;
    /// Load a session row by id, if present.
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, ScoutError>;
    /// Delete a session row.
    async fn delete(&self, id: &SessionId) -> Result<(), ScoutError>;
}

/// SQLite-backed implementation, opened in WAL mode.
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self, ScoutError> {
        let conn = Connection::open(path).map_err(|e| ScoutError::Other(Box::new(e)))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| ScoutError::Other(Box::new(e)))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                content_ref TEXT NOT NULL,
                title TEXT NOT NULL,
                history_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_active TEXT NOT NULL,
                turn_count INTEGER NOT NULL,
                model_key TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| ScoutError::Other(Box::new(e)))?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Open an in-memory database, mainly useful for tests.
    pub fn open_in_memory() -> Result<Self, ScoutError> {
        let conn = Connection::open_in_memory().map_err(|e| ScoutError::Other(Box::new(e)))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                content_ref TEXT NOT NULL,
                title TEXT NOT NULL,
                history_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_active TEXT NOT NULL,
                turn_count INTEGER NOT NULL,
                model_key TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| ScoutError::Other(Box::new(e)))?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }
}

#[async_trait::async_trait]
impl DurableSessionStore for SqliteSessionStore {
    async fn save(&self, session: &Session) -> Result<(), ScoutError> {
        let conn = self.conn.clone();
        let session = session.clone();
        tokio::task::spawn_blocking(move || {
            let history_json = serde_json::to_string(&session.history)
                .map_err(|e| ScoutError::Other(Box::new(e)))?;
            let conn = conn.lock().expect("session db mutex poisoned");
            conn.execute(
                "INSERT INTO sessions (id, content_ref, title, history_json, created_at, last_active, turn_count, model_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    content_ref = excluded.content_ref,
                    title = excluded.title,
                    history_json = excluded.history_json,
                    last_active = excluded.last_active,
                    turn_count = excluded.turn_count,
                    model_key = excluded.model_key",
                params![
                    session.id.as_str(),
                    session.content_ref,
                    session.title,
                    history_json,
                    session.created_at.to_rfc3339(),
                    session.last_active.to_rfc3339(),
                    session.turn_count as i64,
                    session.model_key,
                ],
            )
            .map_err(|e| ScoutError::Other(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(|e| ScoutError::Other(Box::new(e)))?
    }

    async fn load(&self, id: &SessionId) -> Result<Option<Session>, ScoutError> {
        let conn = self.conn.clone();
        let id = id.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("session db mutex poisoned");
            let row = conn
                .query_row(
                    "SELECT content_ref, title, history_json, created_at, last_active, turn_count, model_key
                     FROM sessions WHERE id = ?1",
                    params![id.as_str()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, i64>(5)?,
                            row.get::<_, String>(6)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| ScoutError::Other(Box::new(e)))?;
            let Some((content_ref, title, history_json, created_at, last_active, turn_count, model_key)) = row else {
                return Ok(None);
            };
            let history = serde_json::from_str(&history_json).map_err(|e| ScoutError::Other(Box::new(e)))?;
            let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| ScoutError::Other(Box::new(e)))?
                .with_timezone(&chrono::Utc);
            let last_active = chrono::DateTime::parse_from_rfc3339(&last_active)
                .map_err(|e| ScoutError::Other(Box::new(e)))?
                .with_timezone(&chrono::Utc);
            Ok(Some(Session {
                id,
                content_ref,
                title,
                history,
                created_at,
                last_active,
                turn_count: turn_count as usize,
                model_key,
            }))
        })
        .await
        .map_err(|e| ScoutError::Other(Box::new(e)))?
    }

    async fn delete(&self, id: &SessionId) -> Result<(), ScoutError> {
        let conn = self.conn.clone();
        let id = id.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("session db mutex poisoned");
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![id.as_str()])
                .map_err(|e| ScoutError::Other(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(|e| ScoutError::Other(Box::new(e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_types::{HistoryPart, HistoryTurn};

    fn sample(id: &str) -> Session {
        let now = chrono::Utc::now();
        let turn = HistoryTurn { role: "user".into(), parts: vec![HistoryPart::Text { text: "hi".into() }] };
        Session {
            id: SessionId::new(id),
            content_ref: "vid1".into(),
            title: "t".into(),
            history: vec![turn],
            created_at: now,
            last_active: now,
            turn_count: 1,
            model_key: "scout-pro-2".into(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = SqliteSessionStore::open_in_memory().unwrap();
        let session = sample("abc123");
        store.save(&session).await.unwrap();
        let loaded = store.load(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.turn_count, 1);
        let HistoryPart::Text { text } = &loaded.history[0].parts[0] else { panic!() };
        assert_eq!(text, "hi");
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let store = SqliteSessionStore::open_in_memory().unwrap();
        assert!(store.load(&SessionId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_is_an_upsert() {
        let store = SqliteSessionStore::open_in_memory().unwrap();
        let mut session = sample("abc123");
        store.save(&session).await.unwrap();
        session.turn_count = 5;
        store.save(&session).await.unwrap();
        let loaded = store.load(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.turn_count, 5);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = SqliteSessionStore::open_in_memory().unwrap();
        let session = sample("abc123");
        store.save(&session).await.unwrap();
        store.delete(&session.id).await.unwrap();
        assert!(store.load(&session.id).await.unwrap().is_none());
    }
}
