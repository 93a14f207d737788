use std::time::Duration;

use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{SpanData, SpanExporter as SdkSpanExporter};
use opentelemetry_sdk::Resource;
use parking_lot::Mutex;

use crate::composite::backend::{BackendHandle, Capabilities, SpanBackendHandle};
use crate::env::{ResolvedConfig, Signal};
use crate::errors::{aggregate_sdk_results, TelemetryError};
use crate::options::Protocol;

const CONSOLE_CAPABILITIES: Capabilities = Capabilities {
    flush: false,
    shutdown: true,
};
const OTLP_CAPABILITIES: Capabilities = Capabilities {
    flush: true,
    shutdown: true,
};

/// Fans every span export, flush, and shutdown out to a fixed, ordered set
/// of backends and aggregates their failures into one result.
///
/// The backend collection never changes after construction. A single lock
/// per composite serializes all operations: a batch is either offered to
/// every backend or the call has not returned, and no two operations
/// interleave their backend calls.
#[derive(Debug)]
pub struct CompositeSpanExporter {
    backends: Mutex<Vec<SpanBackendHandle>>,
}

impl CompositeSpanExporter {
    pub(crate) fn new(backends: Vec<SpanBackendHandle>) -> Self {
        Self {
            backends: Mutex::new(backends),
        }
    }

    /// Registered backend labels, in fan-out order.
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.lock().iter().map(|h| h.name).collect()
    }

    fn flush_backends(&self) -> OTelSdkResult {
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
        let mut backends = self.backends.lock();
        let mut failures = Vec::new();
        for handle in backends.iter_mut() {
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

impl SdkSpanExporter for CompositeSpanExporter {
    fn export(
        &self,
        batch: Vec<SpanData>,
    ) -> impl std::future::Future<Output = OTelSdkResult> + Send {
        async move {
            // Held across the sequential backend awaits: the lock is what
            // keeps concurrent operations from interleaving backend calls.
            let backends = self.backends.lock();
            let mut failures = Vec::new();
            for handle in backends.iter() {
                if let Err(err) = handle.backend.export(batch.clone()).await {
                    failures.push(err);
                }
            }
            aggregate_sdk_results(failures)
        }
    }

    fn force_flush(&mut self) -> OTelSdkResult {
        self.flush_backends()
    }

    fn shutdown_with_timeout(&mut self, _timeout: Duration) -> OTelSdkResult {
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
pub(crate) fn console_otlp(config: &ResolvedConfig) -> Result<CompositeSpanExporter, TelemetryError> {
    let protocol = config.protocol_for(Signal::Traces)?;
    Ok(CompositeSpanExporter::new(vec![
        console_backend(),
        otlp_backend(config, protocol)?,
    ]))
}

/// Factory for a console-only exporter, mirroring the stock `console`
/// selection.
pub(crate) fn console(_config: &ResolvedConfig) -> Result<CompositeSpanExporter, TelemetryError> {
    Ok(CompositeSpanExporter::new(vec![console_backend()]))
}

/// Factory for a plain OTLP exporter, mirroring the stock `otlp` selection.
pub(crate) fn otlp(config: &ResolvedConfig) -> Result<CompositeSpanExporter, TelemetryError> {
    let protocol = config.protocol_for(Signal::Traces)?;
    Ok(CompositeSpanExporter::new(vec![otlp_backend(
        config, protocol,
    )?]))
}

fn console_backend() -> SpanBackendHandle {
    BackendHandle::new(
        "console",
        CONSOLE_CAPABILITIES,
        Box::new(opentelemetry_stdout::SpanExporter::default()),
    )
}

fn otlp_backend(
    config: &ResolvedConfig,
    protocol: Protocol,
) -> Result<SpanBackendHandle, TelemetryError> {
    match protocol {
        Protocol::Grpc => {
            #[cfg(feature = "grpc")]
            {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_tonic()
                    .with_endpoint(config.endpoint_for(protocol))
                    .with_timeout(config.export_timeout)
                    .build()
                    .map_err(|source| TelemetryError::ExporterBuild {
                        backend: "gRPC span",
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
                    "{}/v1/traces",
                    config.endpoint_for(protocol).trim_end_matches('/')
                );
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .with_endpoint(endpoint)
                    .with_timeout(config.export_timeout)
                    .build()
                    .map_err(|source| TelemetryError::ExporterBuild {
                        backend: "HTTP span",
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
