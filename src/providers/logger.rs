use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::Resource;

use crate::env::ResolvedConfig;
use crate::errors::TelemetryError;
use crate::registry;

/// Build a [`SdkLoggerProvider`] batching into the selected composite log
/// exporter.
///
/// # Errors
///
/// Returns an error if exporter selection or construction fails.
pub(crate) fn build_logger_provider(
    resource: Resource,
    config: &ResolvedConfig,
) -> Result<SdkLoggerProvider, TelemetryError> {
    let exporter = registry::new_log_exporter(config)?;

    let provider = SdkLoggerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();

    Ok(provider)
}
