use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::Resource;

use crate::env::{ResolvedConfig, Signal};
use crate::errors::TelemetryError;
use crate::options::Protocol;

/// Build and globally register a [`SdkMeterProvider`] with a periodic
/// reader over a protocol-selected OTLP metric exporter.
///
/// Metrics have no console leg: the exporter goes straight to the
/// collector, matching the plain `otlp` selection for the other signals.
///
/// # Errors
///
/// Returns an error if protocol resolution or exporter construction fails.
pub(crate) fn build_meter_provider(
    resource: Resource,
    config: &ResolvedConfig,
) -> Result<SdkMeterProvider, TelemetryError> {
    let exporter = build_metric_exporter(config)?;
    let reader = PeriodicReader::builder(exporter).build();

    let provider = SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build();

    opentelemetry::global::set_meter_provider(provider.clone());

    Ok(provider)
}

fn build_metric_exporter(
    config: &ResolvedConfig,
) -> Result<opentelemetry_otlp::MetricExporter, TelemetryError> {
    let protocol = config.protocol_for(Signal::Metrics)?;
    match protocol {
        Protocol::Grpc => {
            #[cfg(feature = "grpc")]
            {
                opentelemetry_otlp::MetricExporter::builder()
                    .with_tonic()
                    .with_endpoint(config.endpoint_for(protocol))
                    .with_timeout(config.export_timeout)
                    .build()
                    .map_err(|source| TelemetryError::ExporterBuild {
                        backend: "gRPC metric",
                        source,
                    })
            }
            #[cfg(not(feature = "grpc"))]
            {
                Err(TelemetryError::TransportDisabled {
                    transport: "gRPC",
                    feature: "grpc",
                })
            }
        }
        Protocol::HttpProtobuf => {
            #[cfg(feature = "http")]
            {
                let endpoint = format!(
                    "{}/v1/metrics",
                    config.endpoint_for(protocol).trim_end_matches('/')
                );
                opentelemetry_otlp::MetricExporter::builder()
                    .with_http()
                    .with_endpoint(endpoint)
                    .with_timeout(config.export_timeout)
                    .build()
                    .map_err(|source| TelemetryError::ExporterBuild {
                        backend: "HTTP metric",
                        source,
                    })
            }
            #[cfg(not(feature = "http"))]
            {
                Err(TelemetryError::TransportDisabled {
                    transport: "HTTP",
                    feature: "http",
                })
            }
        }
    }
}
