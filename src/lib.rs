//! # otel-fanout
//!
//! Composite console+OTLP telemetry fan-out: one call to initialize
//! tracing, metrics, and logging, with every exported span and log record
//! mirrored to stdout *and* an OTLP collector.
//!
//! Spans and log records flow through composite exporters that fan each
//! batch out to a console sink (always first, so telemetry stays visible
//! locally even when the collector is down) and a remote OTLP backend
//! selected from `OTEL_EXPORTER_OTLP_*_PROTOCOL` configuration. Backend
//! failures never mask each other: every backend is attempted and the
//! failures come back folded into a single [`AggregateError`].
//!
//! ## Quick Start
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! let mut guard = otel_fanout::init_telemetry("my-service", "1.0.0", None)?;
//!
//! tracing::info!("This goes to stdout AND the OTLP collector");
//!
//! guard.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configured Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use otel_fanout::{Protocol, TelemetryOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! let _guard = otel_fanout::init_telemetry("my-service", "1.0.0", Some(
//!     TelemetryOptions::builder()
//!         .endpoint("http://collector:4318")
//!         .protocol(Protocol::HttpProtobuf)
//!         .resource_attributes([("deployment.environment", "production")])
//!         .export_timeout(Duration::from_secs(30))
//!         .build(),
//! ))?;
//! # Ok(())
//! # }
//! ```

mod attributes;
mod composite;
mod env;
mod errors;
mod guard;
mod options;
mod providers;
mod registry;
mod resource;
mod subscriber;

pub mod re_exports;

pub use attributes::{prefix_attributers, prefix_attributes, Attributer};
pub use composite::{CompositeLogExporter, CompositeSpanExporter};
pub use errors::{aggregate_errors, AggregateError, BoxError, TelemetryError};
pub use guard::TelemetryGuard;
pub use options::{Protocol, TelemetryOptions, TelemetryOptionsBuilder};
pub use registry::COMPOSITE_EXPORTER_NAME;

use anyhow::Context;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

/// Initialize telemetry for the given service identity.
///
/// Builds the shared identity [resource](opentelemetry_sdk::Resource),
/// wires batching trace, metric, and log providers to their composite
/// exporters, installs the trace and meter providers process-wide together
/// with a trace-context + baggage propagator, composes a global tracing
/// subscriber, and returns a [`TelemetryGuard`] owning all three provider
/// lifecycles.
///
/// The guard **must** be held for the duration of the application. Call
/// [`TelemetryGuard::shutdown`] exactly once on the way out (dropping the
/// guard is the fallback).
///
/// # Configuration Priority
///
/// 1. **Programmatic** — values set in [`TelemetryOptions`]
/// 2. **Environment variables** — `OTEL_EXPORTER_OTLP_PROTOCOL`,
///    `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_SERVICE_NAME`, etc.
/// 3. **Defaults** — `http/protobuf` to `http://localhost:4318`, 30s
///    timeout, `info` log level
///
/// # Errors
///
/// Returns an error if:
/// - A protocol variable holds anything but `"grpc"` or `"http/protobuf"`
/// - A remote exporter or provider fails to construct
/// - The global tracing subscriber has already been set
///
/// Providers constructed before the failing step are left installed with
/// no teardown path; treat an initialization error as fatal to the
/// process.
pub fn init_telemetry(
    service_name: &str,
    service_version: &str,
    options: Option<TelemetryOptions>,
) -> anyhow::Result<TelemetryGuard> {
    let opts = options.unwrap_or_default();
    let resolved = env::resolve_config(service_name, service_version, &opts);

    // W3C trace context plus baggage, so both span identity and request
    // metadata survive process hops.
    opentelemetry::global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));

    let resource = resource::build_resource(
        &resolved.service_name,
        &resolved.service_version,
        &resolved.resource_attributes,
    );

    let tracer_provider = providers::tracer::build_tracer_provider(resource.clone(), &resolved)
        .context("Failed to initialize tracer provider")?;

    let meter_provider = providers::meter::build_meter_provider(resource.clone(), &resolved)
        .context("Failed to initialize meter provider")?;

    let logger_provider = providers::logger::build_logger_provider(resource, &resolved)
        .context("Failed to initialize logger provider")?;

    subscriber::compose_subscriber(&tracer_provider, &meter_provider, &logger_provider)
        .context("Failed to compose and set global subscriber")?;

    Ok(TelemetryGuard::new(
        tracer_provider,
        meter_provider,
        logger_provider,
    ))
}
