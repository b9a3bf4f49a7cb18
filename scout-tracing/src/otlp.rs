//! The OTLP exporter wiring, compiled in only under the `otel` feature.

use opentelemetry::KeyValue;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use scout_errors::ScoutError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::settings::TracingSettings;

/// Holds the tracer provider so [`crate::TracingGuard::shutdown`] can flush it.
pub struct OtlpProvider {
    provider: SdkTracerProvider,
}

impl OtlpProvider {
    pub fn shutdown(self) {
        if let Err(err) = self.provider.shutdown() {
            tracing::warn!(error = %err, "otlp: error flushing tracer provider on shutdown");
        }
    }
}

/// Build and install the global subscriber: an env-filtered `fmt` layer for
/// local stderr output, plus a `tracing-opentelemetry` layer exporting
/// spans to `settings.trace_store_uri` over OTLP/gRPC.
pub fn install(settings: &TracingSettings) -> Result<OtlpProvider, ScoutError> {
    let endpoint = settings
        .trace_store_uri
        .as_deref()
        .ok_or_else(|| ScoutError::Other("tracing_enabled is set but trace_store_uri is missing".into()))?;

    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| ScoutError::Other(Box::new(e)))?;

    let mut resource = Resource::builder().with_service_name("scout-mcp");
    if let Some(experiment) = &settings.experiment_name {
        resource = resource.with_attribute(KeyValue::new("deployment.environment.name", experiment.clone()));
    }

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource.build())
        .build();

    opentelemetry::global::set_tracer_provider(provider.clone());
    let tracer = opentelemetry::trace::TracerProvider::tracer(&provider, "scout-tracing");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| ScoutError::Other(Box::new(e)))?;

    Ok(OtlpProvider { provider })
}
