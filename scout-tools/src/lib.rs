#![deny(missing_docs)]
//! The closed tool catalog: schema validation, the shared request pipeline,
//! and every tool handler behind the object-safe [`ToolSpec`] trait.
//!
//! [`build_catalog`] is the single assembly point `scout-server`'s
//! composition root calls to register every tool this process exposes.

mod catalog;
mod content;
mod context;
mod infra;
mod knowledge;
mod research;
mod search;
mod spec;
mod util;
mod video;

pub use catalog::{ToolCatalog, ToolDescriptor};
pub use context::ToolContext;
pub use spec::{envelope, validate_input, ToolAnnotations, ToolSpec};

use std::sync::Arc;

/// Build the full closed tool catalog (every tool named in the tool surface)
/// bound to a shared [`ToolContext`].
pub fn build_catalog(ctx: Arc<ToolContext>) -> ToolCatalog {
    let mut catalog = ToolCatalog::new();

    catalog.register(Arc::new(video::VideoAnalyze { ctx: ctx.clone() }));
    catalog.register(Arc::new(video::VideoBatchAnalyze { ctx: ctx.clone() }));
    catalog.register(Arc::new(video::VideoCreateSession { ctx: ctx.clone() }));
    catalog.register(Arc::new(video::VideoContinueSession { ctx: ctx.clone() }));
    catalog.register(Arc::new(video::VideoMetadata { ctx: ctx.clone() }));
    catalog.register(Arc::new(video::VideoComments { ctx: ctx.clone() }));
    catalog.register(Arc::new(video::VideoPlaylist { ctx: ctx.clone() }));

    catalog.register(Arc::new(content::ContentAnalyze { ctx: ctx.clone() }));
    catalog.register(Arc::new(content::ContentBatchAnalyze { ctx: ctx.clone() }));
    catalog.register(Arc::new(content::ContentExtract { ctx: ctx.clone() }));

    catalog.register(Arc::new(research::ResearchDeep { ctx: ctx.clone() }));
    catalog.register(Arc::new(research::ResearchPlan { ctx: ctx.clone() }));
    catalog.register(Arc::new(research::ResearchAssessEvidence { ctx: ctx.clone() }));
    catalog.register(Arc::new(research::ResearchDocument { ctx: ctx.clone() }));

    catalog.register(Arc::new(search::WebSearch { ctx: ctx.clone() }));

    catalog.register(Arc::new(infra::InfraCache { ctx: ctx.clone() }));
    catalog.register(Arc::new(infra::InfraConfigure { ctx: ctx.clone() }));

    catalog.register(Arc::new(knowledge::KnowledgeSearch { ctx: ctx.clone() }));
    catalog.register(Arc::new(knowledge::KnowledgeRelated { ctx: ctx.clone() }));
    catalog.register(Arc::new(knowledge::KnowledgeStats { ctx: ctx.clone() }));
    catalog.register(Arc::new(knowledge::KnowledgeFetch { ctx: ctx.clone() }));
    catalog.register(Arc::new(knowledge::KnowledgeIngest { ctx: ctx.clone() }));
    catalog.register(Arc::new(knowledge::KnowledgeAsk { ctx: ctx.clone() }));
    catalog.register(Arc::new(knowledge::KnowledgeQuery { ctx }));

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_config::{Config, ConfigHandle};
    use scout_generative::GenerativeClient;
    use scout_knowledge::KnowledgeSink;
    use scout_session::{SessionStore, SessionStoreConfig};
    use scout_upload::{PollConfig, UploadBackend, UploadCoordinator, UploadHandle, UploadState};

    struct NoopUploadBackend;

    #[async_trait::async_trait]
    impl UploadBackend for NoopUploadBackend {
        async fn upload(&self, _bytes: &[u8], _mime_type: &str) -> Result<UploadHandle, scout_errors::ScoutError> {
            Err(scout_errors::ScoutError::Other("unused in this test".into()))
        }

        async fn poll_status(&self, _uri: &str) -> Result<UploadState, scout_errors::ScoutError> {
            Err(scout_errors::ScoutError::Other("unused in this test".into()))
        }
    }

    fn test_context() -> Arc<ToolContext> {
        Arc::new(ToolContext {
            config: Arc::new(ConfigHandle::new(Config::default())),
            generative: Arc::new(GenerativeClient::new("test-key")),
            cache: Arc::new(
                futures::executor::block_on(scout_cache::AnalysisCache::new(std::env::temp_dir().join("scout-tools-test-cache"), 1)).unwrap(),
            ),
            context_cache: Arc::new(
                futures::executor::block_on(scout_context_cache::ContextCacheRegistry::load(
                    std::env::temp_dir().join("scout-tools-test-context-cache.json"),
                ))
                .unwrap(),
            ),
            knowledge_sink: KnowledgeSink::disabled(),
            knowledge_client: None,
            sessions: Arc::new(SessionStore::new(SessionStoreConfig::default(), None)),
            upload: Arc::new(UploadCoordinator::new(Arc::new(NoopUploadBackend), 1_000_000).poll_config(PollConfig::default())),
            http: reqwest::Client::new(),
            url_policy: Default::default(),
        })
    }

    #[test]
    fn build_catalog_registers_every_tool_in_the_closed_surface() {
        let catalog = build_catalog(test_context());
        assert_eq!(catalog.len(), 24);

        let expected = [
            "video_analyze",
            "video_batch_analyze",
            "video_create_session",
            "video_continue_session",
            "video_metadata",
            "video_comments",
            "video_playlist",
            "content_analyze",
            "content_batch_analyze",
            "content_extract",
            "research_deep",
            "research_plan",
            "research_assess_evidence",
            "research_document",
            "web_search",
            "infra_cache",
            "infra_configure",
            "knowledge_search",
            "knowledge_related",
            "knowledge_stats",
            "knowledge_fetch",
            "knowledge_ingest",
            "knowledge_ask",
            "knowledge_query",
        ];
        for name in expected {
            assert!(catalog.get(name).is_some(), "missing tool: {name}");
        }
    }

    #[test]
    fn descriptors_cover_the_whole_catalog_and_are_sorted() {
        let catalog = build_catalog(test_context());
        let descriptors = catalog.descriptors();
        assert_eq!(descriptors.len(), 24);
        let mut sorted = descriptors.clone();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(descriptors.iter().map(|d| &d.name).collect::<Vec<_>>(), sorted.iter().map(|d| &d.name).collect::<Vec<_>>());
    }
}
