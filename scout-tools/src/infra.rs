//! Operator-facing infrastructure tools: cache introspection/clearing and
//! live configuration patching. Both are gated behind `infra_mutations_enabled`
//! and, when set, an admin token — the same gate [`scout_config::ConfigHandle::update`]
//! enforces for configuration, replicated here for the cache tool since cache
//! operations never go through that handle.

use crate::context::ToolContext;
use crate::spec::{envelope, ToolAnnotations, ToolSpec};
use scout_config::ConfigOverrides;
use scout_errors::ScoutError;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

fn check_infra_gate(config: &scout_config::Config, admin_token: Option<&str>) -> Result<(), ScoutError> {
    if !config.infra_mutations_enabled {
        return Err(ScoutError::PermissionDenied("infra_mutations_enabled is false; infra tools are disabled".to_string()));
    }
    if let Some(expected) = &config.infra_admin_token {
        if admin_token != Some(expected.expose()) {
            return Err(ScoutError::PermissionDenied("admin token mismatch".to_string()));
        }
    }
    Ok(())
}

/// `infra_cache`: inspect or clear the analysis cache.
pub struct InfraCache {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for InfraCache {
    fn name(&self) -> &'static str {
        "infra_cache"
    }
    fn description(&self) -> &'static str {
        "Inspect or clear the analysis cache (stats, list, or clear by content id)."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["action"],
            "properties": {
                "action": {"type": "string", "enum": ["stats", "list", "clear"]},
                "content_id": {"type": "string"},
                "admin_token": {"type": "string"}
            }
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::destructive()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(infra_cache(&self.ctx, &input).await) })
    }
}

async fn infra_cache(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let admin_token = input.get("admin_token").and_then(Value::as_str);
    check_infra_gate(&ctx.config.get(), admin_token)?;

    let action = input["action"].as_str().unwrap_or_default();
    match action {
        "stats" => {
            let stats = ctx.cache.stats().await?;
            Ok(json!({"action": "stats", "entry_count": stats.entry_count, "total_bytes": stats.total_bytes}))
        }
        "list" => {
            let entries = ctx.cache.list_entries().await?;
            let entries: Vec<Value> = entries
                .into_iter()
                .map(|e| json!({"content_id": e.content_id, "tool": e.tool, "model": e.model, "cached_at": e.cached_at.to_rfc3339()}))
                .collect();
            Ok(json!({"action": "list", "entries": entries}))
        }
        "clear" => {
            let content_id = input.get("content_id").and_then(Value::as_str);
            let removed = ctx.cache.clear(content_id).await?;
            Ok(json!({"action": "clear", "removed": removed}))
        }
        other => Err(ScoutError::ApiInvalidArgument(format!("unknown infra_cache action: {other}"))),
    }
}

/// `infra_configure`: patch the live configuration snapshot.
pub struct InfraConfigure {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for InfraConfigure {
    fn name(&self) -> &'static str {
        "infra_configure"
    }
    fn description(&self) -> &'static str {
        "Patch the live runtime configuration (model defaults, cache TTL, session limits, and related toggles)."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "default_model": {"type": "string"},
                "flash_model": {"type": "string"},
                "default_temperature": {"type": "number"},
                "cache_ttl_days": {"type": "integer", "minimum": 0},
                "max_sessions": {"type": "integer", "minimum": 1},
                "session_timeout_hours": {"type": "integer", "minimum": 0},
                "retry_max_attempts": {"type": "integer", "minimum": 0},
                "reranker_enabled": {"type": "boolean"},
                "flash_summarize": {"type": "boolean"},
                "tracing_enabled": {"type": "boolean"},
                "clear_cache_on_shutdown": {"type": "boolean"},
                "admin_token": {"type": "string"}
            }
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::destructive()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(infra_configure(&self.ctx, &input).await) })
    }
}

async fn infra_configure(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let admin_token = input.get("admin_token").and_then(Value::as_str);

    let overrides = ConfigOverrides {
        default_model: input.get("default_model").and_then(Value::as_str).map(String::from),
        flash_model: input.get("flash_model").and_then(Value::as_str).map(String::from),
        default_temperature: input.get("default_temperature").and_then(Value::as_f64),
        cache_ttl_days: input.get("cache_ttl_days").and_then(Value::as_u64).map(|v| v as u32),
        max_sessions: input.get("max_sessions").and_then(Value::as_u64).map(|v| v as usize),
        session_timeout_hours: input.get("session_timeout_hours").and_then(Value::as_u64).map(|v| v as u32),
        retry_max_attempts: input.get("retry_max_attempts").and_then(Value::as_u64).map(|v| v as u32),
        reranker_enabled: input.get("reranker_enabled").and_then(Value::as_bool),
        flash_summarize: input.get("flash_summarize").and_then(Value::as_bool),
        tracing_enabled: input.get("tracing_enabled").and_then(Value::as_bool),
        clear_cache_on_shutdown: input.get("clear_cache_on_shutdown").and_then(Value::as_bool),
    };

    let published = ctx.config.update(overrides, admin_token)?;
    Ok(json!({
        "default_model": published.default_model,
        "flash_model": published.flash_model,
        "default_temperature": published.default_temperature,
        "cache_ttl_days": published.cache_ttl_days,
        "max_sessions": published.max_sessions,
        "session_timeout_hours": published.session_timeout_hours,
        "retry_max_attempts": published.retry_max_attempts,
        "reranker_enabled": published.reranker_enabled,
        "flash_summarize": published.flash_summarize,
        "tracing_enabled": published.tracing_enabled,
        "clear_cache_on_shutdown": published.clear_cache_on_shutdown,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_config::Config;

    #[test]
    fn infra_gate_rejects_when_mutations_disabled() {
        let config = Config::default();
        let err = check_infra_gate(&config, None).unwrap_err();
        assert!(matches!(err, ScoutError::PermissionDenied(_)));
    }

    #[test]
    fn infra_gate_passes_when_enabled_and_no_token_set() {
        let mut config = Config::default();
        config.infra_mutations_enabled = true;
        assert!(check_infra_gate(&config, None).is_ok());
    }

    #[test]
    fn infra_gate_rejects_admin_token_mismatch() {
        let mut config = Config::default();
        config.infra_mutations_enabled = true;
        config.infra_admin_token = Some(scout_config::Redacted::new("correct"));
        let err = check_infra_gate(&config, Some("wrong")).unwrap_err();
        assert!(matches!(err, ScoutError::PermissionDenied(_)));
    }
}
