//! The shared service bundle every tool handler is constructed with.
//!
//! Assembled once by `scout-server`'s composition root and handed to every
//! tool as an `Arc<ToolContext>`; nothing here is handler-specific.

use scout_config::ConfigHandle;
use scout_context_cache::ContextCacheRegistry;
use scout_generative::GenerativeClient;
use scout_knowledge::{KnowledgeClient, KnowledgeSink};
use scout_policy::UrlPolicyConfig;
use scout_session::SessionStore;
use scout_upload::UploadCoordinator;
use std::sync::Arc;

/// Every singleton a tool handler may depend on.
pub struct ToolContext {
    /// The live, atomically-swappable configuration snapshot.
    pub config: Arc<ConfigHandle>,
    /// The generative backend client used by every generation-backed tool.
    pub generative: Arc<GenerativeClient>,
    /// The file-keyed analysis cache.
    pub cache: Arc<scout_cache::AnalysisCache>,
    /// The backend-side context cache registry.
    pub context_cache: Arc<ContextCacheRegistry>,
    /// The knowledge store write-through sink (a no-op sink when disabled).
    pub knowledge_sink: KnowledgeSink,
    /// The knowledge store client, when one is configured.
    pub knowledge_client: Option<Arc<KnowledgeClient>>,
    /// The in-memory/durable video session store.
    pub sessions: Arc<SessionStore>,
    /// The file-upload coordinator.
    pub upload: Arc<UploadCoordinator>,
    /// The shared HTTP client used for source downloads.
    pub http: reqwest::Client,
    /// The outbound URL policy.
    pub url_policy: UrlPolicyConfig,
}

impl ToolContext {
    /// Current model/temperature/thinking-level defaults, read fresh on
    /// every call so an `infra_configure` patch takes effect immediately.
    pub fn model_defaults(&self) -> (String, scout_types::ThinkingLevel, f64) {
        let config = self.config.get();
        (config.default_model.clone(), config.default_thinking_level, config.default_temperature)
    }

    /// The model used for cheap summarization passes.
    pub fn flash_model(&self) -> String {
        self.config.get().flash_model.clone()
    }
}
