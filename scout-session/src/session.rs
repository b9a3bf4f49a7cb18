//! The `Session` entity.

use chrono::{DateTime, Utc};
use scout_types::{HistoryTurn, SessionId};
use serde::{Deserialize, Serialize};

/// A video/content analysis session: a content handle plus bounded
/// conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque short identifier.
    pub id: SessionId,
    /// The content this session is grounded in (a video id, file reference, …).
    pub content_ref: String,
    /// Display title.
    pub title: String,
    /// Ordered conversation history, trimmed to `2 * session_max_turns` parts.
    pub history: Vec<HistoryTurn>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last used.
    pub last_active: DateTime<Utc>,
    /// Number of completed (user, model) turn pairs.
    pub turn_count: usize,
    /// Model identifier this session generates against.
    pub model_key: String,
}

impl Session {
    /// Append a completed `(user, model)` turn pair and trim history to
    /// `2 * max_turns` items (invariant 2).
    pub fn append_turn(&mut self, user_turn: HistoryTurn, model_turn: HistoryTurn, max_turns: usize) {
        self.history.push(user_turn);
        self.history.push(model_turn);
        self.turn_count += 1;
        let cap = 2 * max_turns;
        if self.history.len() > cap {
            let excess = self.history.len() - cap;
            self.history.drain(0..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(text: &str) -> HistoryTurn {
        HistoryTurn { role: "user".into(), parts: vec![scout_types::HistoryPart::Text { text: text.into() }] }
    }

    fn new_session() -> Session {
        let now = Utc::now();
        Session {
            id: SessionId::new("s1"),
            content_ref: "vid1".into(),
            title: "t".into(),
            history: vec![],
            created_at: now,
            last_active: now,
            turn_count: 0,
            model_key: "scout-pro-2".into(),
        }
    }

    #[test]
    fn append_turn_trims_history_to_cap() {
        let mut session = new_session();
        for i in 0..10 {
            session.append_turn(turn(&format!("u{i}")), turn(&format!("m{i}")), 2);
        }
        assert_eq!(session.history.len(), 4);
        assert_eq!(session.turn_count, 10);
    }

    #[test]
    fn oldest_pairs_are_evicted_first() {
        let mut session = new_session();
        session.append_turn(turn("u0"), turn("m0"), 1);
        session.append_turn(turn("u1"), turn("m1"), 1);
        assert_eq!(session.history.len(), 2);
        let scout_types::HistoryPart::Text { text } = &session.history[0].parts[0] else { panic!() };
        assert_eq!(text, "u1");
    }
}
