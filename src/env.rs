use std::collections::HashMap;
use std::time::Duration;

use crate::errors::TelemetryError;
use crate::options::{Protocol, TelemetryOptions};

const DEFAULT_GRPC_ENDPOINT: &str = "http://localhost:4317";
const DEFAULT_HTTP_ENDPOINT: &str = "http://localhost:4318";
const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Generic OTLP protocol variable, consulted when no signal-specific
/// variable is set.
const OTEL_EXPORTER_OTLP_PROTOCOL: &str = "OTEL_EXPORTER_OTLP_PROTOCOL";

/// A telemetry signal type, used to key signal-specific configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    Traces,
    Metrics,
    Logs,
}

impl Signal {
    /// The signal-specific OTLP protocol variable for this signal.
    fn protocol_env_key(self) -> &'static str {
        match self {
            Signal::Traces => "OTEL_EXPORTER_OTLP_TRACES_PROTOCOL",
            Signal::Metrics => "OTEL_EXPORTER_OTLP_METRICS_PROTOCOL",
            Signal::Logs => "OTEL_EXPORTER_OTLP_LOGS_PROTOCOL",
        }
    }
}

/// Fully resolved configuration after merging programmatic options, env
/// vars, and defaults.
///
/// Priority (highest to lowest):
/// 1. Programmatic — values set in [`TelemetryOptions`]
/// 2. Environment variables — `OTEL_EXPORTER_OTLP_*`
/// 3. Defaults — localhost endpoints, `http/protobuf`, 30s timeout
///
/// The OTLP protocol stays unresolved here: each signal resolves its own
/// at exporter construction via [`ResolvedConfig::protocol_for`], since the
/// signal-specific variables may disagree.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub service_name: String,
    pub service_version: String,
    pub endpoint: Option<String>,
    pub protocol: Option<Protocol>,
    // TODO: pass programmatic headers to exporter builders (tonic MetadataMap / reqwest headers).
    // The OTLP SDK already reads OTEL_EXPORTER_OTLP_HEADERS natively for env-var-based headers.
    #[allow(dead_code)]
    pub headers: HashMap<String, String>,
    pub resource_attributes: HashMap<String, String>,
    pub export_timeout: Duration,
}

impl ResolvedConfig {
    /// Resolve the OTLP protocol for one signal.
    ///
    /// Checks, in order: the programmatic option, the signal-specific
    /// variable, the generic variable, then defaults to `http/protobuf`.
    /// A non-empty variable holding anything but `grpc` or `http/protobuf`
    /// is a configuration error, not a silent fallback.
    pub fn protocol_for(&self, signal: Signal) -> Result<Protocol, TelemetryError> {
        if let Some(protocol) = self.protocol {
            return Ok(protocol);
        }
        let value = env_var_non_empty(signal.protocol_env_key())
            .or_else(|| env_var_non_empty(OTEL_EXPORTER_OTLP_PROTOCOL));
        match value {
            Some(value) => parse_protocol(&value),
            None => Ok(Protocol::HttpProtobuf),
        }
    }

    /// The OTLP endpoint for a given protocol, falling back to the
    /// conventional localhost port when nothing is configured.
    pub fn endpoint_for(&self, protocol: Protocol) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            let default = match protocol {
                Protocol::Grpc => DEFAULT_GRPC_ENDPOINT,
                Protocol::HttpProtobuf => DEFAULT_HTTP_ENDPOINT,
            };
            default.to_owned()
        })
    }
}

/// Resolve configuration by merging programmatic options, env vars, and defaults.
pub(crate) fn resolve_config(
    service_name: &str,
    service_version: &str,
    opts: &TelemetryOptions,
) -> ResolvedConfig {
    let service_name =
        env_var_non_empty("OTEL_SERVICE_NAME").unwrap_or_else(|| service_name.to_owned());

    let endpoint = opts
        .endpoint
        .clone()
        .or_else(|| env_var_non_empty("OTEL_EXPORTER_OTLP_ENDPOINT"));

    let mut headers = parse_headers_env();
    // Programmatic headers take precedence over env var headers
    headers.extend(opts.headers.clone());

    let export_timeout = opts
        .export_timeout
        .or_else(parse_timeout_env)
        .unwrap_or(DEFAULT_EXPORT_TIMEOUT);

    ResolvedConfig {
        service_name,
        service_version: service_version.to_owned(),
        endpoint,
        protocol: opts.protocol,
        headers,
        resource_attributes: opts.resource_attributes.clone(),
        export_timeout,
    }
}

pub(crate) fn env_var_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn parse_protocol(value: &str) -> Result<Protocol, TelemetryError> {
    match value {
        "grpc" => Ok(Protocol::Grpc),
        "http/protobuf" => Ok(Protocol::HttpProtobuf),
        _ => Err(TelemetryError::InvalidProtocol {
            value: value.to_owned(),
        }),
    }
}

fn parse_headers_env() -> HashMap<String, String> {
    env_var_non_empty("OTEL_EXPORTER_OTLP_HEADERS")
        .map(|val| {
            val.split(',')
                .filter_map(|pair| {
                    let (key, value) = pair.split_once('=')?;
                    let key = key.trim();
                    let value = value.trim();
                    if key.is_empty() {
                        return None;
                    }
                    Some((key.to_owned(), value.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_timeout_env() -> Option<Duration> {
    env_var_non_empty("OTEL_EXPORTER_OTLP_TIMEOUT")
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TelemetryOptions;

    const NO_OTEL_ENV: [(&str, Option<&str>); 7] = [
        ("OTEL_SERVICE_NAME", None),
        ("OTEL_EXPORTER_OTLP_ENDPOINT", None),
        ("OTEL_EXPORTER_OTLP_PROTOCOL", None),
        ("OTEL_EXPORTER_OTLP_TRACES_PROTOCOL", None),
        ("OTEL_EXPORTER_OTLP_LOGS_PROTOCOL", None),
        ("OTEL_EXPORTER_OTLP_HEADERS", None),
        ("OTEL_EXPORTER_OTLP_TIMEOUT", None),
    ];

    #[test]
    fn resolve_defaults_with_no_options_or_env() {
        temp_env::with_vars(NO_OTEL_ENV, || {
            let opts = TelemetryOptions::default();
            let resolved = resolve_config("test-service", "1.2.3", &opts);

            assert_eq!(resolved.service_name, "test-service");
            assert_eq!(resolved.service_version, "1.2.3");
            assert_eq!(resolved.endpoint, None);
            assert!(resolved.headers.is_empty());
            assert!(resolved.resource_attributes.is_empty());
            assert_eq!(resolved.export_timeout, Duration::from_secs(30));

            let protocol = resolved.protocol_for(Signal::Traces).unwrap();
            assert_eq!(protocol, Protocol::HttpProtobuf);
            assert_eq!(resolved.endpoint_for(protocol), "http://localhost:4318");
        });
    }

    #[test]
    fn programmatic_options_take_precedence() {
        temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_ENDPOINT", Some("http://env:4317")),
                ("OTEL_EXPORTER_OTLP_PROTOCOL", Some("grpc")),
            ],
            || {
                let opts = TelemetryOptions::builder()
                    .endpoint("http://programmatic:4318")
                    .protocol(Protocol::HttpProtobuf)
                    .export_timeout(Duration::from_secs(60))
                    .build();

                let resolved = resolve_config("test-service", "0.1.0", &opts);

                assert_eq!(
                    resolved.endpoint,
                    Some("http://programmatic:4318".to_owned())
                );
                assert_eq!(resolved.export_timeout, Duration::from_secs(60));
                assert_eq!(
                    resolved.protocol_for(Signal::Traces).unwrap(),
                    Protocol::HttpProtobuf
                );
            },
        );
    }

    #[test]
    fn signal_specific_protocol_beats_generic() {
        temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_PROTOCOL", Some("grpc")),
                ("OTEL_EXPORTER_OTLP_LOGS_PROTOCOL", Some("http/protobuf")),
                ("OTEL_EXPORTER_OTLP_TRACES_PROTOCOL", None),
            ],
            || {
                let resolved =
                    resolve_config("test-service", "0.1.0", &TelemetryOptions::default());

                assert_eq!(
                    resolved.protocol_for(Signal::Logs).unwrap(),
                    Protocol::HttpProtobuf
                );
                // Traces only have the generic variable to go on.
                assert_eq!(
                    resolved.protocol_for(Signal::Traces).unwrap(),
                    Protocol::Grpc
                );
            },
        );
    }

    #[test]
    fn invalid_protocol_is_a_configuration_error() {
        temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_PROTOCOL", Some("carrier-pigeon")),
                ("OTEL_EXPORTER_OTLP_METRICS_PROTOCOL", None),
            ],
            || {
                let resolved =
                    resolve_config("test-service", "0.1.0", &TelemetryOptions::default());

                let err = resolved.protocol_for(Signal::Metrics).unwrap_err();
                let message = err.to_string();
                assert!(message.contains("carrier-pigeon"));
                assert!(message.contains("grpc"));
                assert!(message.contains("http/protobuf"));
            },
        );
    }

    #[test]
    fn grpc_protocol_uses_port_4317_default() {
        temp_env::with_vars(NO_OTEL_ENV, || {
            let opts = TelemetryOptions::builder().protocol(Protocol::Grpc).build();
            let resolved = resolve_config("test-service", "0.1.0", &opts);

            assert_eq!(
                resolved.endpoint_for(Protocol::Grpc),
                "http://localhost:4317"
            );
        });
    }

    #[test]
    fn parse_headers_from_env() {
        temp_env::with_vars(
            [("OTEL_EXPORTER_OTLP_HEADERS", Some("key1=val1,key2=val2"))],
            || {
                let headers = parse_headers_env();

                assert_eq!(headers.get("key1"), Some(&"val1".to_owned()));
                assert_eq!(headers.get("key2"), Some(&"val2".to_owned()));
            },
        );
    }

    #[test]
    fn service_name_env_overrides_argument() {
        temp_env::with_vars([("OTEL_SERVICE_NAME", Some("from-env"))], || {
            let resolved = resolve_config("from-arg", "0.1.0", &TelemetryOptions::default());

            assert_eq!(resolved.service_name, "from-env");
        });
    }
}
