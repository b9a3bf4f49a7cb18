//! The object-safe tool trait every handler implements, and the envelope
//! helper that bakes invariant 7 ("a tool never raises") into a plain
//! [`serde_json::Value`] rather than a `Result`.

use scout_errors::{make_tool_error, ScoutError};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Side-effect characteristics of a tool, surfaced to the upstream client
/// alongside its schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolAnnotations {
    /// The tool only reads state; it never mutates the server or any store.
    pub read_only: bool,
    /// The tool can irreversibly change external state (e.g. patch config).
    pub destructive: bool,
    /// Calling the tool twice with the same input has the same effect as calling it once.
    pub idempotent: bool,
}

impl ToolAnnotations {
    /// The common case: a generative-backend or store read with no side effects.
    pub fn read_only() -> Self {
        ToolAnnotations { read_only: true, destructive: false, idempotent: true }
    }

    /// A tool that writes through to a store or mutates server state, but
    /// never destroys anything a repeat call wouldn't also produce.
    pub fn idempotent_write() -> Self {
        ToolAnnotations { read_only: false, destructive: false, idempotent: true }
    }

    /// A tool that can irreversibly change shared state (config patch, cache clear).
    pub fn destructive() -> Self {
        ToolAnnotations { read_only: false, destructive: true, idempotent: false }
    }
}

/// One entry in the closed tool catalog.
///
/// Object-safe so every tool can live behind an `Arc<dyn ToolSpec>` in one
/// [`crate::catalog::ToolCatalog`] map. Unlike a typical fallible handler,
/// `call` returns a bare [`Value`] — never a `Result` — because every escape
/// path must already be the tool's success shape or the error envelope from
/// [`scout_errors::make_tool_error`]; there is no outer layer left to catch
/// an `Err` that would leak past the boundary.
pub trait ToolSpec: Send + Sync {
    /// The tool's wire name, exactly as it appears in the closed tool surface.
    fn name(&self) -> &'static str;

    /// A human-readable description surfaced to the upstream client.
    fn description(&self) -> &'static str;

    /// The JSON Schema inputs are validated against before dispatch.
    fn input_schema(&self) -> Value;

    /// Side-effect characteristics surfaced alongside the schema.
    fn annotations(&self) -> ToolAnnotations;

    /// Run the tool. Never panics across this boundary; every failure path
    /// inside an implementation must be converted via [`envelope`] first.
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>>;
}

/// Convert a handler's `Result` into the tool's final wire value: the
/// success payload on `Ok`, or the `{error, category, hint, retryable,
/// retry_after_seconds}` envelope on `Err`.
pub fn envelope(result: Result<Value, ScoutError>) -> Value {
    match result {
        Ok(value) => value,
        Err(err) => serde_json::to_value(make_tool_error(&err)).unwrap_or_else(|_| {
            serde_json::json!({
                "error": "failed to serialize error envelope",
                "category": "UNKNOWN",
                "hint": "an unexpected error occurred",
                "retryable": false,
            })
        }),
    }
}

/// Validate `input` against `schema` before a handler touches it, producing
/// `ScoutError::ApiInvalidArgument` on any mismatch.
pub fn validate_input(input: &Value, schema: &Value) -> Result<(), ScoutError> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| ScoutError::ApiInvalidArgument(format!("invalid input_schema: {e}")))?;
    if let Err(errors) = validator.validate(input) {
        return Err(ScoutError::ApiInvalidArgument(format!("input failed schema validation: {errors}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_passes_success_value_through_unchanged() {
        let value = serde_json::json!({"summary": "ok"});
        assert_eq!(envelope(Ok(value.clone())), value);
    }

    #[test]
    fn envelope_wraps_error_in_tool_error_shape() {
        let value = envelope(Err(ScoutError::FileNotFound("x".into())));
        assert_eq!(value["category"], "FILE_NOT_FOUND");
        assert_eq!(value["retryable"], false);
    }

    #[test]
    fn validate_input_rejects_missing_required_field() {
        let schema = serde_json::json!({"type": "object", "required": ["video_url"]});
        let err = validate_input(&serde_json::json!({}), &schema).unwrap_err();
        assert!(matches!(err, ScoutError::ApiInvalidArgument(_)));
    }

    #[test]
    fn validate_input_accepts_conforming_input() {
        let schema = serde_json::json!({"type": "object", "required": ["video_url"]});
        assert!(validate_input(&serde_json::json!({"video_url": "https://x"}), &schema).is_ok());
    }
}
