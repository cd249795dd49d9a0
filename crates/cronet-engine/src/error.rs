//! # Design
//!
//! - Centralize engine-construction errors for the bootstrap surface.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use cronet_config::ConfigError;
use cronet_telemetry::TelemetryError;
use thiserror::Error;

/// Result alias for engine wiring operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure reported by a `NetworkEngine` while starting up.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineCreateError {
    message: String,
}

impl EngineCreateError {
    /// Wrap an engine-supplied reason.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Reason reported by the engine.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Engine wiring error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be assembled.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: ConfigError,
    },
    /// The engine rejected the configuration it was handed.
    #[error("invalid argument")]
    InvalidArgument {
        /// Operation identifier.
        operation: &'static str,
        /// Source engine error.
        source: EngineCreateError,
    },
    /// Telemetry setup failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: TelemetryError,
    },
}

impl EngineError {
    pub(crate) const fn config(operation: &'static str, source: ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn invalid_argument(
        operation: &'static str,
        source: EngineCreateError,
    ) -> Self {
        Self::InvalidArgument { operation, source }
    }

    pub(crate) const fn telemetry(operation: &'static str, source: TelemetryError) -> Self {
        Self::Telemetry { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn engine_error_helpers_build_variants() {
        let config = EngineError::config(
            "build",
            ConfigError::InvalidConfiguration {
                field: "allow_non_default_network_usage",
                message: "conflict",
            },
        );
        assert!(matches!(config, EngineError::Config { operation: "build", .. }));
        assert_eq!(config.to_string(), "configuration operation failed");
        assert!(config.source().is_some());

        let invalid = EngineError::invalid_argument("create", EngineCreateError::new("bad json"));
        assert_eq!(invalid.to_string(), "invalid argument");
        assert_eq!(
            invalid.source().map(ToString::to_string).as_deref(),
            Some("bad json")
        );

        let telemetry = EngineError::telemetry(
            "metrics",
            TelemetryError::InvalidVersion {
                value: "x".to_string(),
            },
        );
        assert!(matches!(telemetry, EngineError::Telemetry { .. }));
    }
}
