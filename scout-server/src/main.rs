//! `scout-server`: builds every singleton, assembles the tool catalog, and
//! serves it over MCP/stdio until the client disconnects.

use std::sync::Arc;

use clap::Parser;
use scout_config::ConfigHandle;
use scout_context_cache::ContextCacheRegistry;
use scout_generative::GenerativeClient;
use scout_knowledge::{KnowledgeClient, KnowledgeSink};
use scout_retry::RetryPolicy;
use scout_server::{load_config, Cli, ScoutServer};
use scout_session::{SessionStore, SessionStoreConfig, SqliteSessionStore};
use scout_tools::ToolContext;
use scout_tracing::TracingSettings;
use scout_upload::UploadCoordinator;

const SERVER_NAME: &str = "scout-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const CONTEXT_CACHE_STATE_FILE: &str = ".scout-context-cache.json";
/// Files at or under this size are inlined rather than uploaded.
const INLINE_THRESHOLD_BYTES: u64 = 20 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), scout_errors::ScoutError> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let tracing_guard = scout_tracing::setup(&TracingSettings {
        enabled: config.tracing_enabled,
        trace_store_uri: config.trace_store_uri.clone(),
        experiment_name: config.experiment_name.clone(),
    })?;

    tracing::info!(version = SERVER_VERSION, "scout-server: starting up");

    let config_handle = Arc::new(ConfigHandle::new(config.clone()));

    let generative = Arc::new(
        GenerativeClient::new(config.api_key.expose())
            .retry_policy(RetryPolicy {
                max_attempts: config.retry_max_attempts,
                base_delay_secs: config.retry_base_delay,
                max_delay_secs: config.retry_max_delay,
            }),
    );

    let cache = Arc::new(scout_cache::AnalysisCache::new(config.cache_dir.clone(), config.cache_ttl_days).await?);

    let context_cache = Arc::new(ContextCacheRegistry::load(CONTEXT_CACHE_STATE_FILE).await?);

    let knowledge_client = config
        .knowledge_url
        .as_ref()
        .map(|url| Arc::new(KnowledgeClient::new(url.clone(), config.knowledge_api_key.as_ref().map(|k| k.expose()).unwrap_or(""))));
    if let Some(client) = &knowledge_client {
        if let Err(err) = client.ensure_collections().await {
            tracing::warn!(error = %err, "scout-server: failed to sync knowledge store schema at startup");
        }
    }
    let knowledge_sink = match &knowledge_client {
        Some(client) => KnowledgeSink::connected(client.clone()),
        None => KnowledgeSink::disabled(),
    };

    let durable_sessions = match &config.session_db_path {
        Some(path) => Some(Arc::new(SqliteSessionStore::open(path)?) as Arc<dyn scout_session::DurableSessionStore>),
        None => None,
    };
    let sessions = Arc::new(SessionStore::new(
        SessionStoreConfig {
            max_sessions: config.max_sessions,
            session_timeout_hours: config.session_timeout_hours as i64,
            session_max_turns: config.session_max_turns,
        },
        durable_sessions,
    ));

    let upload = Arc::new(UploadCoordinator::new(generative.clone(), INLINE_THRESHOLD_BYTES));

    let ctx = Arc::new(ToolContext {
        config: config_handle,
        generative,
        cache,
        context_cache: context_cache.clone(),
        knowledge_sink,
        knowledge_client: knowledge_client.clone(),
        sessions,
        upload,
        http: reqwest::Client::new(),
        url_policy: Default::default(),
    });

    let catalog = Arc::new(scout_tools::build_catalog(ctx.clone()));
    let server = ScoutServer::new(catalog, SERVER_NAME, SERVER_VERSION);

    let serve_result = server.serve_stdio().await;

    tracing::info!("scout-server: shutting down");

    // Shutdown order per the specification: tracing shutdown, then the
    // context-cache clear, then knowledge/generative clients. Neither
    // client wraps a resource with an explicit async close (both are
    // `reqwest::Client` handles), so "closing" them is the drop of `ctx`
    // at the end of this function; what we control explicitly is the
    // ordering of the two steps that do have real work to do.
    tracing_guard.shutdown();

    if let Err(err) = context_cache.clear(|_name| async {}).await {
        tracing::warn!(error = %err, "scout-server: failed to clear context cache registry on shutdown");
    }
    if config.clear_cache_on_shutdown {
        if let Err(err) = ctx.cache.clear(None).await {
            tracing::warn!(error = %err, "scout-server: failed to clear analysis cache on shutdown");
        }
    }

    tracing::debug!("scout-server: closing knowledge client");
    drop(knowledge_client);
    tracing::debug!("scout-server: closing generative client");
    drop(ctx);

    serve_result
}
