#![deny(missing_docs)]
//! Span instrumentation for tool calls, with an optional OTLP exporter.
//!
//! [`trace`] wraps a future in a named span and is always present — Rust's
//! attribute macros need a real target, so unlike the spec's identity
//! decorator there is no build where tool calls run completely unwrapped.
//! What varies is whether that span ever leaves the process: [`setup`]
//! only installs a local `fmt` subscriber unless `tracing_enabled` is set
//! *and* this crate was compiled with the `otel` feature, in which case it
//! also stands up an OTLP exporter and a `tracing-opentelemetry` layer.
//! [`TracingGuard::shutdown`] flushes that exporter; otherwise it is a
//! no-op. This mirrors the optionality of the teacher's `neuron-otel`,
//! which never assumes an exporter is listening on the other end.

mod settings;

#[cfg(feature = "otel")]
mod otlp;

pub use settings::TracingSettings;

use std::future::Future;
use tracing::Instrument;

/// The `span_type` tag every tool handler's span carries.
pub const TOOL_SPAN: &str = "TOOL";

/// Wrap `fut` in a span named `tool_call`, tagged with `name` and `span_type`.
///
/// Every tool handler's dispatch is wrapped as `trace(tool_name, TOOL_SPAN, ...)`.
/// With no subscriber installed the span is free (tracing's fast path for an
/// unregistered callsite); with [`setup`] having installed one, it is
/// recorded locally and, under `otel`, exported.
pub fn trace<Fut>(name: &str, span_type: &str, fut: Fut) -> impl Future<Output = Fut::Output>
where
    Fut: Future,
{
    let span = tracing::info_span!("tool_call", tool.name = %name, tool.span_type = %span_type);
    fut.instrument(span)
}

/// A handle to whatever [`setup`] installed. Dropping it leaks any pending
/// exporter buffer; call [`TracingGuard::shutdown`] explicitly on the
/// process shutdown path instead.
pub struct TracingGuard {
    #[cfg(feature = "otel")]
    provider: Option<otlp::OtlpProvider>,
}

impl TracingGuard {
    /// Flush and close the exporter, if one was installed. A no-op when
    /// tracing was never enabled or the `otel` feature is not compiled in.
    pub fn shutdown(self) {
        #[cfg(feature = "otel")]
        if let Some(provider) = self.provider {
            provider.shutdown();
        }
    }
}

/// Install the process-wide tracing subscriber.
///
/// - `settings.enabled` false, or the `otel` feature not compiled in: installs
///   a local env-filtered `fmt` subscriber only. [`TracingGuard::shutdown`] is
///   then a no-op.
/// - `settings.enabled` true and `otel` compiled in: additionally builds an
///   OTLP/gRPC exporter against `settings.trace_store_uri` and layers
///   `tracing-opentelemetry` on top, tagging the resource with
///   `settings.experiment_name` when set.
///
/// Idempotent only in the sense that it is meant to be called once, at
/// process startup; a second call will fail to install a subscriber because
/// one is already set globally.
pub fn setup(settings: &TracingSettings) -> Result<TracingGuard, scout_errors::ScoutError> {
    #[cfg(feature = "otel")]
    {
        if settings.enabled {
            let provider = otlp::install(settings)?;
            return Ok(TracingGuard { provider: Some(provider) });
        }
    }

    let _ = settings;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(TracingGuard {
        #[cfg(feature = "otel")]
        provider: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trace_wraps_and_returns_the_future_output() {
        let result = trace("unit_test_tool", TOOL_SPAN, async { 1 + 1 }).await;
        assert_eq!(result, 2);
    }

    #[test]
    fn tracing_settings_default_is_disabled() {
        let settings = TracingSettings::default();
        assert!(!settings.enabled);
        assert!(settings.trace_store_uri.is_none());
    }
}
