/// The subset of the live configuration [`crate::setup`] needs.
///
/// Kept as a small, crate-local struct rather than a dependency on
/// `scout-config` directly, so this crate stays a leaf the way the
/// teacher's `neuron-otel` does (it only takes a small `OtelConfig`, never
/// the host's full configuration type).
#[derive(Debug, Clone, Default)]
pub struct TracingSettings {
    /// Mirrors [`Config::tracing_enabled`]. When false, [`crate::setup`]
    /// installs only a local `fmt` subscriber and never initializes an
    /// OTLP exporter, regardless of whether the `otel` feature is compiled in.
    ///
    /// [`Config::tracing_enabled`]: https://docs.rs/scout-config
    pub enabled: bool,
    /// The OTLP collector endpoint traces are exported to. Required for
    /// export to actually happen; `enabled` alone only turns on local spans.
    pub trace_store_uri: Option<String>,
    /// Tags every exported span with a `deployment.environment.name`
    /// (or equivalent) resource attribute, so traces from concurrent
    /// experiments don't mix in the backend.
    pub experiment_name: Option<String>,
}
