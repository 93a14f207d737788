use std::time::Duration;

use opentelemetry::InstrumentationScope;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::logs::{LogBatch, LogExporter as SdkLogExporter, SdkLogRecord};
use opentelemetry_sdk::Resource;
use parking_lot::Mutex;

use crate::composite::backend::{BackendHandle, Capabilities, LogBackendHandle};
use crate::env::{ResolvedConfig, Signal};
use crate::errors::{aggregate_sdk_results, TelemetryError};
use crate::options::Protocol;

const CONSOLE_CAPABILITIES: Capabilities = Capabilities {
    flush: false,
    shutdown: true,
};
const OTLP_CAPABILITIES: Capabilities = Capabilities {
    flush: false,
    shutdown: true,
};

/// Fans every log record batch out to a fixed, ordered set of backends and
/// aggregates their failures into one result.
///
/// Same discipline as [`CompositeSpanExporter`](super::CompositeSpanExporter):
/// the backend collection is fixed at construction and a single per-instance
/// lock serializes export, flush, and shutdown against each other.
#[derive(Debug)]
pub struct CompositeLogExporter {
    backends: Mutex<Vec<LogBackendHandle>>,
}

impl CompositeLogExporter {
    pub(crate) fn new(backends: Vec<LogBackendHandle>) -> Self {
        Self {
            backends: Mutex::new(backends),
        }
    }

    /// Registered backend labels, in fan-out order.
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.lock().iter().map(|h| h.name).collect()
    }

    /// Flush every backend that supports flushing, aggregating failures.
    ///
    /// The SDK's log exporter contract has no flush operation, so this is
    /// exposed as an inherent method for callers that manage the composite
    /// directly.
    pub fn force_flush(&self) -> OTelSdkResult {
        let mut backends = self.backends.lock();
        let mut failures = Vec::new();
        for handle in backends.iter_mut() {
            if !handle.capabilities.flush {
                continue;
            }
            if let Err(err) = handle.backend.force_flush() {
                failures.push(err);
            }
        }
        aggregate_sdk_results(failures)
    }

    fn shutdown_backends(&self) -> OTelSdkResult {
        let backends = self.backends.lock();
        let mut failures = Vec::new();
        for handle in backends.iter() {
            if !handle.capabilities.shutdown {
                continue;
            }
            if let Err(err) = handle.backend.shutdown() {
                failures.push(err);
            }
        }
        aggregate_sdk_results(failures)
    }
}

impl SdkLogExporter for CompositeLogExporter {
    fn export(
        &self,
        batch: LogBatch<'_>,
    ) -> impl std::future::Future<Output = OTelSdkResult> + Send {
        async move {
            // The borrowed batch cannot be handed to more than one backend,
            // so materialize it once and re-lend it per backend.
            let records: Vec<(SdkLogRecord, InstrumentationScope)> = batch
                .iter()
                .map(|(record, scope)| (record.clone(), scope.clone()))
                .collect();
            let borrowed: Vec<(&SdkLogRecord, &InstrumentationScope)> =
                records.iter().map(|(record, scope)| (record, scope)).collect();

            let backends = self.backends.lock();
            let mut failures = Vec::new();
            for handle in backends.iter() {
                if let Err(err) = handle.backend.export(LogBatch::new(&borrowed)).await {
                    failures.push(err);
                }
            }
            aggregate_sdk_results(failures)
        }
    }

    fn shutdown_with_timeout(&self, _timeout: Duration) -> OTelSdkResult {
        self.shutdown_backends()
    }

    fn set_resource(&mut self, resource: &Resource) {
        for handle in self.backends.lock().iter_mut() {
            handle.backend.set_resource(resource);
        }
    }
}

/// Composite factory: console sink first, then one OTLP backend chosen by
/// the resolved protocol. Registered under the `console+otlp` name.
pub(crate) fn console_otlp(config: &ResolvedConfig) -> Result<CompositeLogExporter, TelemetryError> {
    let protocol = config.protocol_for(Signal::Logs)?;
    Ok(CompositeLogExporter::new(vec![
        console_backend(),
        otlp_backend(config, protocol)?,
    ]))
}

/// Factory for a console-only exporter, mirroring the stock `console`
/// selection.
pub(crate) fn console(_config: &ResolvedConfig) -> Result<CompositeLogExporter, TelemetryError> {
    Ok(CompositeLogExporter::new(vec![console_backend()]))
}

/// Factory for a plain OTLP exporter, mirroring the stock `otlp` selection.
pub(crate) fn otlp(config: &ResolvedConfig) -> Result<CompositeLogExporter, TelemetryError> {
    let protocol = config.protocol_for(Signal::Logs)?;
    Ok(CompositeLogExporter::new(vec![otlp_backend(
        config, protocol,
    )?]))
}

fn console_backend() -> LogBackendHandle {
    BackendHandle::new(
        "console",
        CONSOLE_CAPABILITIES,
        Box::new(opentelemetry_stdout::LogExporter::default()),
    )
}

fn otlp_backend(
    config: &ResolvedConfig,
    protocol: Protocol,
) -> Result<LogBackendHandle, TelemetryError> {
    match protocol {
        Protocol::Grpc => {
            #[cfg(feature = "grpc")]
            {
                let exporter = opentelemetry_otlp::LogExporter::builder()
                    .with_tonic()
                    .with_endpoint(config.endpoint_for(protocol))
                    .with_timeout(config.export_timeout)
                    .build()
                    .map_err(|source| TelemetryError::ExporterBuild {
                        backend: "gRPC log",
                        source,
                    })?;
                Ok(BackendHandle::new(
                    "otlp/grpc",
                    OTLP_CAPABILITIES,
                    Box::new(exporter),
                ))
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
                    "{}/v1/logs",
                    config.endpoint_for(protocol).trim_end_matches('/')
                );
                let exporter = opentelemetry_otlp::LogExporter::builder()
                    .with_http()
                    .with_endpoint(endpoint)
                    .with_timeout(config.export_timeout)
                    .build()
                    .map_err(|source| TelemetryError::ExporterBuild {
                        backend: "HTTP log",
                        source,
                    })?;
                Ok(BackendHandle::new(
                    "otlp/http",
                    OTLP_CAPABILITIES,
                    Box::new(exporter),
                ))
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
