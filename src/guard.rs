use opentelemetry_sdk::error::OTelSdkError;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use thiserror::Error;

use crate::errors::{aggregate_errors, AggregateError};

/// A provider lifecycle failure, labeled with the stage that produced it.
#[derive(Debug, Error)]
#[error("{stage}: {source}")]
struct StageError {
    stage: &'static str,
    #[source]
    source: OTelSdkError,
}

/// Lifecycle guard for the telemetry providers.
///
/// Holds the trace, metric, and log providers and ensures they are flushed
/// and shut down when dropped. **Must be held for the duration of the
/// application.**
///
/// [`TelemetryGuard::shutdown`] tears the providers down in order — trace,
/// then metric, then log — attempting every stage regardless of earlier
/// failures and folding whatever failed into one [`AggregateError`].
#[must_use = "dropping the TelemetryGuard immediately shuts down all telemetry providers — \
              hold it for the lifetime of your application (e.g. `let _guard = ...;`)"]
pub struct TelemetryGuard {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: SdkLoggerProvider,
    shutdown_called: bool,
}

impl TelemetryGuard {
    pub(crate) fn new(
        tracer_provider: SdkTracerProvider,
        meter_provider: SdkMeterProvider,
        logger_provider: SdkLoggerProvider,
    ) -> Self {
        Self {
            tracer_provider,
            meter_provider,
            logger_provider,
            shutdown_called: false,
        }
    }

    /// Explicitly flush and shut down all providers.
    ///
    /// Every provider is attempted even when an earlier one fails; the
    /// failures come back joined in a single [`AggregateError`]. Subsequent
    /// calls are no-ops. Shutdown also runs automatically when the guard is
    /// dropped, reporting failures to stderr instead.
    pub fn shutdown(&mut self) -> Result<(), AggregateError> {
        if self.shutdown_called {
            return Ok(());
        }
        self.shutdown_called = true;
        self.do_shutdown()
    }

    fn do_shutdown(&self) -> Result<(), AggregateError> {
        let mut failures: Vec<StageError> = Vec::new();
        let mut record = |stage: &'static str, result: Result<(), OTelSdkError>| {
            if let Err(source) = result {
                failures.push(StageError { stage, source });
            }
        };

        record("tracer provider flush", self.tracer_provider.force_flush());
        record("tracer provider shutdown", self.tracer_provider.shutdown());

        record("meter provider flush", self.meter_provider.force_flush());
        record("meter provider shutdown", self.meter_provider.shutdown());

        record("logger provider flush", self.logger_provider.force_flush());
        record("logger provider shutdown", self.logger_provider.shutdown());

        aggregate_errors(failures)
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if !self.shutdown_called {
            self.shutdown_called = true;
            if let Err(err) = self.do_shutdown() {
                eprintln!("otel-fanout: error during telemetry shutdown: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use opentelemetry_sdk::logs::SdkLoggerProvider;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use opentelemetry_sdk::trace::SdkTracerProvider;

    use super::*;
    use crate::composite::backend::testing::RecordingBackend;
    use crate::composite::backend::{BackendHandle, Capabilities};
    use crate::composite::{CompositeLogExporter, CompositeSpanExporter};

    const CAPABILITIES: Capabilities = Capabilities {
        flush: true,
        shutdown: true,
    };

    fn guard_with_recording_backends(
        span_shutdowns: Arc<AtomicUsize>,
        log_shutdowns: Arc<AtomicUsize>,
        meter_provider: SdkMeterProvider,
    ) -> TelemetryGuard {
        let span_exporter = CompositeSpanExporter::new(vec![BackendHandle::new(
            "recording",
            CAPABILITIES,
            Box::new(RecordingBackend {
                shutdowns: span_shutdowns,
                ..RecordingBackend::named("span")
            }),
        )]);
        let tracer_provider = SdkTracerProvider::builder()
            .with_batch_exporter(span_exporter)
            .build();

        let log_exporter = CompositeLogExporter::new(vec![BackendHandle::new(
            "recording",
            CAPABILITIES,
            Box::new(RecordingBackend {
                shutdowns: log_shutdowns,
                ..RecordingBackend::named("log")
            }),
        )]);
        let logger_provider = SdkLoggerProvider::builder()
            .with_batch_exporter(log_exporter)
            .build();

        TelemetryGuard::new(tracer_provider, meter_provider, logger_provider)
    }

    #[test]
    fn shutdown_reaches_every_backend() {
        let span_shutdowns = Arc::new(AtomicUsize::new(0));
        let log_shutdowns = Arc::new(AtomicUsize::new(0));

        let meter_provider = SdkMeterProvider::builder().build();
        let mut guard = guard_with_recording_backends(
            span_shutdowns.clone(),
            log_shutdowns.clone(),
            meter_provider,
        );

        guard.shutdown().unwrap();

        assert_eq!(span_shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(log_shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_meter_stage_does_not_stop_the_others() {
        let span_shutdowns = Arc::new(AtomicUsize::new(0));
        let log_shutdowns = Arc::new(AtomicUsize::new(0));

        // Shut the meter provider down up front so the guard's meter stage
        // fails while trace and log stages still run.
        let meter_provider = SdkMeterProvider::builder().build();
        meter_provider.shutdown().unwrap();

        let mut guard = guard_with_recording_backends(
            span_shutdowns.clone(),
            log_shutdowns.clone(),
            meter_provider,
        );

        let err = guard.shutdown().unwrap_err();

        assert_eq!(span_shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(log_shutdowns.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("meter provider"));
        assert!(err.to_string().starts_with("error(s) occurred: "));
    }

    #[test]
    fn shutdown_is_a_no_op_the_second_time() {
        let span_shutdowns = Arc::new(AtomicUsize::new(0));
        let log_shutdowns = Arc::new(AtomicUsize::new(0));

        let mut guard = guard_with_recording_backends(
            span_shutdowns.clone(),
            log_shutdowns.clone(),
            SdkMeterProvider::builder().build(),
        );

        guard.shutdown().unwrap();
        guard.shutdown().unwrap();

        assert_eq!(span_shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(log_shutdowns.load(Ordering::SeqCst), 1);
    }
}
