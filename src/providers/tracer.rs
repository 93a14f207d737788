use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;

use crate::env::ResolvedConfig;
use crate::errors::TelemetryError;
use crate::registry;

/// Build and globally register a [`SdkTracerProvider`] batching into the
/// selected composite span exporter.
///
/// # Errors
///
/// Returns an error if exporter selection or construction fails.
pub(crate) fn build_tracer_provider(
    resource: Resource,
    config: &ResolvedConfig,
) -> Result<SdkTracerProvider, TelemetryError> {
    let exporter = registry::new_span_exporter(config)?;

    let provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();

    // Register globally so auto-instrumentation and context propagation work
    opentelemetry::global::set_tracer_provider(provider.clone());

    Ok(provider)
}
