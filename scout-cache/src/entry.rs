//! The cache entry envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable once written: the full envelope stored at a cache key's path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When this entry was written.
    pub cached_at: DateTime<Utc>,
    /// The content identity this analysis belongs to.
    pub content_id: String,
    /// The tool name that produced this analysis.
    pub tool: String,
    /// The model identifier used to produce this analysis.
    pub model: String,
    /// The cached tool output.
    pub analysis: serde_json::Value,
}

impl CacheEntry {
    /// True if this entry is older than `ttl_days` as of `now`.
    pub fn is_expired(&self, ttl_days: u32, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.cached_at);
        age.num_seconds() > i64::from(ttl_days) * 86_400
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry_at(cached_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            cached_at,
            content_id: "vid1".into(),
            tool: "video_analyze".into(),
            model: "scout-pro-2".into(),
            analysis: serde_json::json!({"summary": "x"}),
        }
    }

    #[test]
    fn fresh_entry_is_not_expired() {
        let now = Utc::now();
        let entry = entry_at(now - Duration::days(1));
        assert!(!entry.is_expired(30, now));
    }

    #[test]
    fn entry_older_than_ttl_is_expired() {
        let now = Utc::now();
        let entry = entry_at(now - Duration::days(31));
        assert!(entry.is_expired(30, now));
    }
}
