use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::logs::{LogBatch, LogExporter as SdkLogExporter};
use opentelemetry_sdk::trace::{SpanData, SpanExporter as SdkSpanExporter};
use opentelemetry_sdk::Resource;

/// Boxed export future, so heterogeneous backends fit one collection.
pub(crate) type BoxedExportFuture<'a> = Pin<Box<dyn Future<Output = OTelSdkResult> + Send + 'a>>;

/// Which optional operations a backend supports.
///
/// Fixed when the backend is registered; the composites consult these flags
/// during fan-out and silently skip operations a backend does not support.
/// Lacking a capability is not an error.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Capabilities {
    pub flush: bool,
    pub shutdown: bool,
}

/// One registered backend plus its capability flags and a short label for
/// introspection.
#[derive(Debug)]
pub(crate) struct BackendHandle<B: ?Sized> {
    pub(crate) name: &'static str,
    pub(crate) capabilities: Capabilities,
    pub(crate) backend: Box<B>,
}

impl<B: ?Sized> BackendHandle<B> {
    pub(crate) fn new(name: &'static str, capabilities: Capabilities, backend: Box<B>) -> Self {
        Self {
            name,
            capabilities,
            backend,
        }
    }
}

pub(crate) type SpanBackendHandle = BackendHandle<dyn SpanBackend>;
pub(crate) type LogBackendHandle = BackendHandle<dyn LogBackend>;

/// Object-safe view of a span exporter backend.
///
/// The SDK's `SpanExporter` trait returns opaque futures and cannot be
/// boxed directly; this trait bridges it so a composite can own a mixed
/// collection of backends. Every SDK span exporter gets the impl for free.
pub(crate) trait SpanBackend: Debug + Send + Sync {
    fn export(&self, batch: Vec<SpanData>) -> BoxedExportFuture<'_>;
    fn force_flush(&mut self) -> OTelSdkResult;
    fn shutdown(&mut self) -> OTelSdkResult;
    fn set_resource(&mut self, resource: &Resource);
}

impl<E: SdkSpanExporter> SpanBackend for E {
    fn export(&self, batch: Vec<SpanData>) -> BoxedExportFuture<'_> {
        Box::pin(SdkSpanExporter::export(self, batch))
    }

    fn force_flush(&mut self) -> OTelSdkResult {
        SdkSpanExporter::force_flush(self)
    }

    fn shutdown(&mut self) -> OTelSdkResult {
        SdkSpanExporter::shutdown(self)
    }

    fn set_resource(&mut self, resource: &Resource) {
        SdkSpanExporter::set_resource(self, resource)
    }
}

/// Object-safe view of a log exporter backend, mirroring [`SpanBackend`].
pub(crate) trait LogBackend: Debug + Send + Sync {
    fn export<'a>(&'a self, batch: LogBatch<'a>) -> BoxedExportFuture<'a>;
    fn force_flush(&mut self) -> OTelSdkResult;
    fn shutdown(&self) -> OTelSdkResult;
    fn set_resource(&mut self, resource: &Resource);
}

impl<E: SdkLogExporter> LogBackend for E {
    fn export<'a>(&'a self, batch: LogBatch<'a>) -> BoxedExportFuture<'a> {
        Box::pin(SdkLogExporter::export(self, batch))
    }

    fn force_flush(&mut self) -> OTelSdkResult {
        // SDK log exporters flush through their processor, not the exporter.
        Ok(())
    }

    fn shutdown(&self) -> OTelSdkResult {
        SdkLogExporter::shutdown(self)
    }

    fn set_resource(&mut self, resource: &Resource) {
        SdkLogExporter::set_resource(self, resource)
    }
}
