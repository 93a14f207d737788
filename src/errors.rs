use std::error::Error as StdError;
use std::fmt;

use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use thiserror::Error;

/// Boxed error type carried inside an [`AggregateError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised while building the telemetry stack.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// An OTLP protocol environment variable held an unsupported value.
    #[error("invalid OTLP protocol {value:?} - should be one of [\"grpc\", \"http/protobuf\"]")]
    InvalidProtocol {
        /// The rejected value, as read from the environment or options.
        value: String,
    },

    /// An exporter selection variable named an exporter nobody registered.
    #[error("unknown {signal} exporter {name:?}")]
    UnknownExporter {
        /// Signal type the selection was for (`"span"` or `"log"`).
        signal: &'static str,
        /// The unrecognized exporter name.
        name: String,
    },

    /// The resolved protocol needs a transport compiled out of this build.
    #[error(
        "{transport} transport requested but the `{feature}` feature is not enabled. \
         Enable it in Cargo.toml: otel-fanout = {{ features = [\"{feature}\"] }}"
    )]
    TransportDisabled {
        /// Human-readable transport name.
        transport: &'static str,
        /// Cargo feature that would enable it.
        feature: &'static str,
    },

    /// A remote backend could not be constructed.
    #[error("failed to build {backend} exporter")]
    ExporterBuild {
        /// Which backend was being built.
        backend: &'static str,
        #[source]
        source: opentelemetry_otlp::ExporterBuildError,
    },
}

/// Zero or more failures from fanning one operation out to independent
/// targets, collapsed into a single reportable error.
///
/// The underlying errors stay addressable through [`AggregateError::errors`]
/// in their original order; `Display` renders the joined legacy form:
/// `error(s) occurred: <msg>,<msg>,…`.
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<BoxError>,
}

impl AggregateError {
    /// The underlying failures, in the order they were collected.
    pub fn errors(&self) -> &[BoxError] {
        &self.errors
    }

    /// Number of underlying failures. Always at least one.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Never true: an aggregate is only constructed from a non-empty set.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the aggregate, yielding the underlying failures.
    pub fn into_errors(self) -> Vec<BoxError> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error(s) occurred: ")?;
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                write!(f, ",")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl StdError for AggregateError {}

/// Fold the failures of a multi-target operation into a single outcome.
///
/// An empty sequence means every target succeeded and yields `Ok(())`.
/// Otherwise every failure is retained, in input order, inside one
/// [`AggregateError`]. Callers must have already attempted *all* targets:
/// this is aggregation after the fact, not short-circuiting.
pub fn aggregate_errors<I>(errors: I) -> Result<(), AggregateError>
where
    I: IntoIterator,
    I::Item: Into<BoxError>,
{
    let errors: Vec<BoxError> = errors.into_iter().map(Into::into).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AggregateError { errors })
    }
}

/// Aggregate backend failures into the single result shape the
/// OpenTelemetry SDK expects from an exporter call.
pub(crate) fn aggregate_sdk_results(errors: Vec<OTelSdkError>) -> OTelSdkResult {
    aggregate_errors(errors).map_err(|err| OTelSdkError::InternalFailure(err.to_string()))
}
