//! Write-through sinks: one per writer collection, per §4.8's writer→collection
//! map. Every sink is best-effort — knowledge-store failures are logged and
//! swallowed so a tool call never fails because the write-through did.

use crate::client::KnowledgeClient;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// A namespace UUID the deterministic `VideoMetadata` ids are derived from
/// (invariant 4: a second insert for the same video replaces rather than
/// duplicates).
const VIDEO_METADATA_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6f, 0xf4, 0x4d, 0x57, 0x46, 0x90, 0x43, 0xce, 0x9a, 0x01, 0x3a, 0x0c, 0x1e, 0x2f, 0x7b, 0x10,
]);

/// The write-through sink. `None` when the knowledge store is disabled
/// (`knowledge_url` unset) — every `store_*` call then short-circuits.
#[derive(Clone)]
pub struct KnowledgeSink {
    client: Option<Arc<KnowledgeClient>>,
}

impl KnowledgeSink {
    /// A sink backed by a connected client.
    pub fn connected(client: Arc<KnowledgeClient>) -> Self {
        KnowledgeSink { client: Some(client) }
    }

    /// A sink with the knowledge store disabled; every write is a no-op.
    pub fn disabled() -> Self {
        KnowledgeSink { client: None }
    }

    async fn write(&self, collection: &str, object_id: String, mut properties: serde_json::Value, source_tool: &str) {
        let Some(client) = &self.client else { return };
        if let serde_json::Value::Object(map) = &mut properties {
            map.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
            map.insert("source_tool".to_string(), json!(source_tool));
        }
        if let Err(e) = client.put_object(collection, &object_id, properties).await {
            warn!(collection, object_id, error = %e, "knowledge sink: write-through failed");
        }
    }

    /// Write a video analysis (single, batch, or per-document from document research).
    pub async fn store_video_analysis(&self, video_id: &str, analysis: serde_json::Value, source_tool: &str) {
        self.write("VideoAnalyses", format!("{video_id}:{source_tool}"), analysis, source_tool).await;
    }

    /// Write a session-continuation turn.
    pub async fn store_session_transcript(&self, session_id: &str, turn_index: usize, turn: serde_json::Value) {
        self.write("SessionTranscripts", format!("{session_id}:{turn_index}"), turn, "video_continue_session").await;
    }

    /// Write video metadata, keyed by a UUID deterministically derived from `video_id`.
    ///
    /// A second call for the same `video_id` overwrites the same object id,
    /// satisfying invariant 4.
    pub async fn store_video_metadata(&self, video_id: &str, metadata: serde_json::Value) {
        let object_id = Uuid::new_v5(&VIDEO_METADATA_NAMESPACE, video_id.as_bytes()).to_string();
        self.write("VideoMetadata", object_id, metadata, "video_metadata").await;
    }

    /// Write a research finding (from deep research or evidence assessment).
    pub async fn store_research_finding(&self, finding_id: &str, finding: serde_json::Value, source_tool: &str) {
        self.write("ResearchFindings", finding_id.to_string(), finding, source_tool).await;
    }

    /// Write a research plan.
    pub async fn store_research_plan(&self, plan_id: &str, plan: serde_json::Value) {
        self.write("ResearchPlans", plan_id.to_string(), plan, "research_plan").await;
    }

    /// Write a content analysis (single or batch).
    pub async fn store_content_analysis(&self, content_id: &str, analysis: serde_json::Value, source_tool: &str) {
        self.write("ContentAnalyses", format!("{content_id}:{source_tool}"), analysis, source_tool).await;
    }

    /// Write a web search result.
    pub async fn store_web_search_result(&self, query_hash: &str, result: serde_json::Value) {
        self.write("WebSearchResults", query_hash.to_string(), result, "web_search").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_sink_is_a_no_op() {
        let sink = KnowledgeSink::disabled();
        sink.store_video_metadata("vid1", json!({"title": "x"})).await;
    }

    #[test]
    fn video_metadata_uuid_is_deterministic() {
        let a = Uuid::new_v5(&VIDEO_METADATA_NAMESPACE, b"vid1");
        let b = Uuid::new_v5(&VIDEO_METADATA_NAMESPACE, b"vid1");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_video_ids_produce_distinct_uuids() {
        let a = Uuid::new_v5(&VIDEO_METADATA_NAMESPACE, b"vid1");
        let b = Uuid::new_v5(&VIDEO_METADATA_NAMESPACE, b"vid2");
        assert_ne!(a, b);
    }
}
