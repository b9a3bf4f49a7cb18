//! The process-wide configuration snapshot.

use crate::redacted::Redacted;
use scout_errors::ScoutError;
use scout_types::ThinkingLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// A single read-mostly snapshot of every runtime parameter.
///
/// Assembled once from the environment at startup via [`Config::from_env`],
/// and thereafter only ever replaced wholesale (never mutated in place) by
/// [`crate::ConfigHandle::update`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Generative backend API key.
    pub api_key: Redacted,
    /// Default model identifier.
    pub default_model: String,
    /// Cheap/fast model identifier, used for summarization passes.
    pub flash_model: String,
    /// Default reasoning depth for generative calls.
    pub default_thinking_level: ThinkingLevel,
    /// Default sampling temperature, in `[0, 2]`.
    pub default_temperature: f64,

    /// Directory the analysis cache writes JSON entries under.
    pub cache_dir: PathBuf,
    /// How many days an analysis cache entry remains valid.
    pub cache_ttl_days: u32,

    /// Maximum number of concurrently tracked sessions.
    pub max_sessions: usize,
    /// Hours of inactivity before a session is evicted.
    pub session_timeout_hours: u32,
    /// Maximum turns retained per session (history is trimmed to `2 * max_turns` parts).
    pub session_max_turns: usize,
    /// Durable session database path. `None` means sessions are in-memory only.
    pub session_db_path: Option<PathBuf>,

    /// Maximum retry attempts for a transient generative-backend failure.
    pub retry_max_attempts: u32,
    /// Base delay, in seconds, for exponential backoff.
    pub retry_base_delay: f64,
    /// Maximum delay, in seconds, a single retry will wait.
    pub retry_max_delay: f64,

    /// Knowledge store base URL. `None` disables the knowledge store entirely.
    pub knowledge_url: Option<String>,
    /// Knowledge store API key.
    pub knowledge_api_key: Option<Redacted>,

    /// Whether a reranker pass runs after knowledge search. Defaults to
    /// `true` automatically when `COHERE_API_KEY` is present in the
    /// environment, per §4.1.
    pub reranker_enabled: bool,
    /// Which reranker backend to use.
    pub reranker_provider: Option<String>,
    /// Whether knowledge hits are condensed by a Flash summarization pass.
    pub flash_summarize: bool,

    /// Whether tracing export is enabled.
    pub tracing_enabled: bool,
    /// Destination URI for exported traces.
    pub trace_store_uri: Option<String>,
    /// Experiment name tag attached to exported traces.
    pub experiment_name: Option<String>,

    /// Restricts local file access to this root, if set.
    pub local_file_access_root: Option<PathBuf>,
    /// Whether `infra_configure` is permitted to mutate the live config.
    pub infra_mutations_enabled: bool,
    /// If set, `infra_configure` calls must present this token.
    pub infra_admin_token: Option<Redacted>,
    /// Maximum number of sources a single `research_document` call may take.
    pub research_document_max_sources: usize,
    /// Bounded concurrency for document-research phases (downloads, uploads, per-doc work).
    pub research_document_phase_concurrency: usize,

    /// Whether the analysis cache directory is wiped on graceful shutdown.
    pub clear_cache_on_shutdown: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: Redacted::default(),
            default_model: "scout-pro-2".to_string(),
            flash_model: "scout-flash-2".to_string(),
            default_thinking_level: ThinkingLevel::default(),
            default_temperature: 1.0,
            cache_dir: PathBuf::from(".scout-cache"),
            cache_ttl_days: 30,
            max_sessions: 256,
            session_timeout_hours: 24,
            session_max_turns: 40,
            session_db_path: None,
            retry_max_attempts: 3,
            retry_base_delay: 1.0,
            retry_max_delay: 30.0,
            knowledge_url: None,
            knowledge_api_key: None,
            reranker_enabled: false,
            reranker_provider: None,
            flash_summarize: true,
            tracing_enabled: false,
            trace_store_uri: None,
            experiment_name: None,
            local_file_access_root: None,
            infra_mutations_enabled: false,
            infra_admin_token: None,
            research_document_max_sources: 12,
            research_document_phase_concurrency: 3,
            clear_cache_on_shutdown: false,
        }
    }
}

impl Config {
    /// Assemble a snapshot from the process environment, falling back to
    /// [`Config::default`] for anything unset.
    pub fn from_env() -> Result<Self, ScoutError> {
        let mut config = Config::default();

        if let Ok(v) = env::var("SCOUT_API_KEY") {
            config.api_key = Redacted::new(v);
        }
        if let Ok(v) = env::var("SCOUT_MODEL_PRESET") {
            if let Some(preset) = crate::presets::ModelPreset::parse(&v) {
                let (default_model, flash_model) = preset.models();
                config.default_model = default_model.to_string();
                config.flash_model = flash_model.to_string();
            }
        }
        if let Ok(v) = env::var("SCOUT_DEFAULT_MODEL") {
            config.default_model = v;
        }
        if let Ok(v) = env::var("SCOUT_FLASH_MODEL") {
            config.flash_model = v;
        }
        if let Ok(v) = env::var("SCOUT_DEFAULT_THINKING_LEVEL") {
            config.default_thinking_level = parse_thinking_level(&v).unwrap_or(config.default_thinking_level);
        }
        if let Ok(v) = env::var("SCOUT_DEFAULT_TEMPERATURE") {
            config.default_temperature = v.parse().map_err(|_| {
                ScoutError::ApiInvalidArgument(format!("SCOUT_DEFAULT_TEMPERATURE not a number: {v}"))
            })?;
        }
        if let Ok(v) = env::var("SCOUT_CACHE_DIR") {
            config.cache_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("SCOUT_CACHE_TTL_DAYS") {
            config.cache_ttl_days = v
                .parse()
                .map_err(|_| ScoutError::ApiInvalidArgument(format!("SCOUT_CACHE_TTL_DAYS not an integer: {v}")))?;
        }
        if let Ok(v) = env::var("SCOUT_MAX_SESSIONS") {
            config.max_sessions = v
                .parse()
                .map_err(|_| ScoutError::ApiInvalidArgument(format!("SCOUT_MAX_SESSIONS not an integer: {v}")))?;
        }
        if let Ok(v) = env::var("SCOUT_SESSION_TIMEOUT_HOURS") {
            config.session_timeout_hours = v.parse().map_err(|_| {
                ScoutError::ApiInvalidArgument(format!("SCOUT_SESSION_TIMEOUT_HOURS not an integer: {v}"))
            })?;
        }
        if let Ok(v) = env::var("SCOUT_SESSION_MAX_TURNS") {
            config.session_max_turns = v
                .parse()
                .map_err(|_| ScoutError::ApiInvalidArgument(format!("SCOUT_SESSION_MAX_TURNS not an integer: {v}")))?;
        }
        if let Ok(v) = env::var("SCOUT_SESSION_DB_PATH") {
            config.session_db_path = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }
        if let Ok(v) = env::var("SCOUT_RETRY_MAX_ATTEMPTS") {
            config.retry_max_attempts = v.parse().map_err(|_| {
                ScoutError::ApiInvalidArgument(format!("SCOUT_RETRY_MAX_ATTEMPTS not an integer: {v}"))
            })?;
        }
        if let Ok(v) = env::var("SCOUT_RETRY_BASE_DELAY") {
            config.retry_base_delay = v
                .parse()
                .map_err(|_| ScoutError::ApiInvalidArgument(format!("SCOUT_RETRY_BASE_DELAY not a number: {v}")))?;
        }
        if let Ok(v) = env::var("SCOUT_RETRY_MAX_DELAY") {
            config.retry_max_delay = v
                .parse()
                .map_err(|_| ScoutError::ApiInvalidArgument(format!("SCOUT_RETRY_MAX_DELAY not a number: {v}")))?;
        }
        if let Ok(v) = env::var("SCOUT_KNOWLEDGE_URL") {
            config.knowledge_url = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("SCOUT_KNOWLEDGE_API_KEY") {
            config.knowledge_api_key = if v.is_empty() { None } else { Some(Redacted::new(v)) };
        }
        if let Ok(v) = env::var("COHERE_API_KEY") {
            if !v.is_empty() {
                config.reranker_enabled = true;
                config.reranker_provider.get_or_insert_with(|| "cohere".to_string());
            }
        }
        if let Ok(v) = env::var("SCOUT_RERANKER_ENABLED") {
            config.reranker_enabled = parse_bool(&v).unwrap_or(config.reranker_enabled);
        }
        if let Ok(v) = env::var("SCOUT_RERANKER_PROVIDER") {
            config.reranker_provider = Some(v);
        }
        if let Ok(v) = env::var("SCOUT_FLASH_SUMMARIZE") {
            config.flash_summarize = parse_bool(&v).unwrap_or(config.flash_summarize);
        }
        if let Ok(v) = env::var("SCOUT_TRACING_ENABLED") {
            config.tracing_enabled = parse_bool(&v).unwrap_or(config.tracing_enabled);
        }
        if let Ok(v) = env::var("SCOUT_TRACE_STORE_URI") {
            config.trace_store_uri = Some(v);
        }
        if let Ok(v) = env::var("SCOUT_EXPERIMENT_NAME") {
            config.experiment_name = Some(v);
        }
        if let Ok(v) = env::var("SCOUT_LOCAL_FILE_ACCESS_ROOT") {
            config.local_file_access_root = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }
        if let Ok(v) = env::var("SCOUT_INFRA_MUTATIONS_ENABLED") {
            config.infra_mutations_enabled = parse_bool(&v).unwrap_or(config.infra_mutations_enabled);
        }
        if let Ok(v) = env::var("SCOUT_INFRA_ADMIN_TOKEN") {
            config.infra_admin_token = if v.is_empty() { None } else { Some(Redacted::new(v)) };
        }
        if let Ok(v) = env::var("SCOUT_RESEARCH_DOCUMENT_MAX_SOURCES") {
            config.research_document_max_sources = v.parse().map_err(|_| {
                ScoutError::ApiInvalidArgument(format!("SCOUT_RESEARCH_DOCUMENT_MAX_SOURCES not an integer: {v}"))
            })?;
        }
        if let Ok(v) = env::var("SCOUT_RESEARCH_DOCUMENT_PHASE_CONCURRENCY") {
            config.research_document_phase_concurrency = v.parse().map_err(|_| {
                ScoutError::ApiInvalidArgument(format!(
                    "SCOUT_RESEARCH_DOCUMENT_PHASE_CONCURRENCY not an integer: {v}"
                ))
            })?;
        }
        if let Ok(v) = env::var("SCOUT_CLEAR_CACHE_ON_SHUTDOWN") {
            config.clear_cache_on_shutdown = parse_bool(&v).unwrap_or(config.clear_cache_on_shutdown);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject an internally inconsistent snapshot. Called on every load and
    /// before every runtime patch is published.
    pub fn validate(&self) -> Result<(), ScoutError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ScoutError::ApiInvalidArgument(format!(
                "default_temperature must be within [0, 2], got {}",
                self.default_temperature
            )));
        }
        if self.retry_max_delay < self.retry_base_delay {
            return Err(ScoutError::ApiInvalidArgument(
                "retry_max_delay must be >= retry_base_delay".to_string(),
            ));
        }
        if self.max_sessions == 0 {
            return Err(ScoutError::ApiInvalidArgument("max_sessions must be nonzero".to_string()));
        }
        if self.research_document_phase_concurrency == 0 {
            return Err(ScoutError::ApiInvalidArgument(
                "research_document_phase_concurrency must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_thinking_level(v: &str) -> Option<ThinkingLevel> {
    match v.to_lowercase().as_str() {
        "minimal" => Some(ThinkingLevel::Minimal),
        "low" => Some(ThinkingLevel::Low),
        "medium" => Some(ThinkingLevel::Medium),
        "high" => Some(ThinkingLevel::High),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn validate_rejects_out_of_range_temperature() {
        let mut config = Config::default();
        config.default_temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_retry_delays() {
        let mut config = Config::default();
        config.retry_base_delay = 10.0;
        config.retry_max_delay = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
