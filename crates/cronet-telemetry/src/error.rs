//! Error types for telemetry operations.
//!
//! Only setup helpers (`init_logging`, `TelemetryMetrics::new`, version parsing) hand these to
//! callers; the reporter converts every emission failure into a log line.

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Installing the tracing subscriber failed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// Building a Prometheus collector failed.
    #[error("failed to build metrics collector")]
    MetricsCollector {
        /// Metric identifier tied to the failure.
        name: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Registering a Prometheus collector failed.
    #[error("failed to register metrics collector")]
    MetricsRegister {
        /// Metric identifier tied to the failure.
        name: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Encoding Prometheus metrics failed.
    #[error("failed to encode metrics")]
    MetricsEncode {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Rendered metrics output was not valid UTF-8.
    #[error("metrics output was not valid utf-8")]
    MetricsUtf8 {
        /// Underlying UTF-8 conversion error.
        source: std::string::FromUtf8Error,
    },
    /// A telemetry event could not be encoded for the sink.
    #[error("failed to encode {event} event")]
    EncodeEvent {
        /// Event kind.
        event: &'static str,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// The sink refused an event.
    #[error("telemetry sink '{sink}' rejected event: {message}")]
    Sink {
        /// Sink identifier.
        sink: &'static str,
        /// Reason reported by the sink.
        message: String,
    },
    /// An engine version string did not have the `major.minor.build.patch` shape.
    #[error("invalid engine version '{value}'")]
    InvalidVersion {
        /// Offending input.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;
    use tracing_subscriber::util::SubscriberInitExt;

    fn try_init_error()
    -> std::result::Result<tracing_subscriber::util::TryInitError, Box<dyn Error>> {
        match tracing_subscriber::registry().try_init() {
            Ok(()) => match tracing_subscriber::registry().try_init() {
                Ok(()) => Err(io::Error::other("expected init error").into()),
                Err(err) => Ok(err),
            },
            Err(err) => Ok(err),
        }
    }

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("invalid")
            .err()
            .unwrap_or_else(|| serde::de::Error::custom("expected invalid json"))
    }

    #[test]
    fn telemetry_error_display_and_source() -> std::result::Result<(), Box<dyn Error>> {
        let init_error = try_init_error()?;
        let utf8_error = String::from_utf8(vec![0, 159])
            .err()
            .ok_or_else(|| io::Error::other("expected utf8 error"))?;
        let cases = vec![
            (
                TelemetryError::SubscriberInstall { source: init_error },
                "failed to install tracing subscriber",
            ),
            (
                TelemetryError::MetricsCollector {
                    name: "metric",
                    source: prometheus::Error::Msg("metrics".to_string()),
                },
                "failed to build metrics collector",
            ),
            (
                TelemetryError::MetricsRegister {
                    name: "metric",
                    source: prometheus::Error::Msg("metrics".to_string()),
                },
                "failed to register metrics collector",
            ),
            (
                TelemetryError::MetricsEncode {
                    source: prometheus::Error::Msg("metrics".to_string()),
                },
                "failed to encode metrics",
            ),
            (
                TelemetryError::MetricsUtf8 { source: utf8_error },
                "metrics output was not valid utf-8",
            ),
            (
                TelemetryError::EncodeEvent {
                    event: "traffic_reported",
                    source: json_error(),
                },
                "failed to encode traffic_reported event",
            ),
        ];

        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
            assert!(err.source().is_some());
        }
        Ok(())
    }

    #[test]
    fn sink_and_version_errors_carry_context() {
        let sink = TelemetryError::Sink {
            sink: "memory",
            message: "closed".to_string(),
        };
        assert_eq!(
            sink.to_string(),
            "telemetry sink 'memory' rejected event: closed"
        );
        let version = TelemetryError::InvalidVersion {
            value: "1.2".to_string(),
        };
        assert_eq!(version.to_string(), "invalid engine version '1.2'");
    }
}
