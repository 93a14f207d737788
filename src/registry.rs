use std::collections::HashMap;
use std::sync::{LazyLock, Once};

use parking_lot::RwLock;

use crate::composite::{log, span, CompositeLogExporter, CompositeSpanExporter};
use crate::env::{env_var_non_empty, ResolvedConfig};
use crate::errors::TelemetryError;

/// Selector name the composite console+OTLP exporter is registered under.
pub const COMPOSITE_EXPORTER_NAME: &str = "console+otlp";

const OTEL_TRACES_EXPORTER: &str = "OTEL_TRACES_EXPORTER";
const OTEL_LOGS_EXPORTER: &str = "OTEL_LOGS_EXPORTER";

pub(crate) type SpanExporterFactory =
    fn(&ResolvedConfig) -> Result<CompositeSpanExporter, TelemetryError>;
pub(crate) type LogExporterFactory =
    fn(&ResolvedConfig) -> Result<CompositeLogExporter, TelemetryError>;

static SPAN_EXPORTERS: LazyLock<RwLock<HashMap<&'static str, SpanExporterFactory>>> =
    LazyLock::new(Default::default);
static LOG_EXPORTERS: LazyLock<RwLock<HashMap<&'static str, LogExporterFactory>>> =
    LazyLock::new(Default::default);

/// Seed the stock exporter names exactly once, before any lookup.
fn register_builtins() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        register_span_exporter("console", span::console);
        register_span_exporter("otlp", span::otlp);
        register_span_exporter(COMPOSITE_EXPORTER_NAME, span::console_otlp);

        register_log_exporter("console", log::console);
        register_log_exporter("otlp", log::otlp);
        register_log_exporter(COMPOSITE_EXPORTER_NAME, log::console_otlp);
    });
}

/// Register a named span exporter factory, replacing any previous holder
/// of the name.
pub(crate) fn register_span_exporter(name: &'static str, factory: SpanExporterFactory) {
    SPAN_EXPORTERS.write().insert(name, factory);
}

/// Register a named log exporter factory, replacing any previous holder
/// of the name.
pub(crate) fn register_log_exporter(name: &'static str, factory: LogExporterFactory) {
    LOG_EXPORTERS.write().insert(name, factory);
}

/// Build the span exporter selected by `OTEL_TRACES_EXPORTER`, defaulting
/// to the composite.
pub(crate) fn new_span_exporter(
    config: &ResolvedConfig,
) -> Result<CompositeSpanExporter, TelemetryError> {
    register_builtins();
    let name = env_var_non_empty(OTEL_TRACES_EXPORTER)
        .unwrap_or_else(|| COMPOSITE_EXPORTER_NAME.to_owned());
    let factory = SPAN_EXPORTERS.read().get(name.as_str()).copied().ok_or(
        TelemetryError::UnknownExporter {
            signal: "span",
            name: name.clone(),
        },
    )?;
    factory(config)
}

/// Build the log exporter selected by `OTEL_LOGS_EXPORTER`, defaulting to
/// the composite.
pub(crate) fn new_log_exporter(
    config: &ResolvedConfig,
) -> Result<CompositeLogExporter, TelemetryError> {
    register_builtins();
    let name =
        env_var_non_empty(OTEL_LOGS_EXPORTER).unwrap_or_else(|| COMPOSITE_EXPORTER_NAME.to_owned());
    let factory = LOG_EXPORTERS.read().get(name.as_str()).copied().ok_or(
        TelemetryError::UnknownExporter {
            signal: "log",
            name: name.clone(),
        },
    )?;
    factory(config)
}
