//! Error types for engine configuration.
//!
//! # Design
//! - Setter validation and patch conflicts share one error type so `build()` callers see a
//!   single failure surface.
//! - Messages name the offending section/field; source errors are preserved, not re-logged.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A scalar setter received a value it cannot accept.
    #[error("invalid value for '{field}' in '{section}': {message}")]
    InvalidField {
        /// Section (builder surface) that failed validation.
        section: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Human-readable error description.
        message: String,
    },
    /// Structured options describe a combination the engine cannot express.
    #[error("invalid configuration for '{field}': {message}")]
    InvalidConfiguration {
        /// Option field responsible for the conflict.
        field: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },
    /// A settings document could not be decoded.
    #[error("failed to decode engine settings")]
    Settings {
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// File system probe failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid_field(
        section: &'static str,
        field: &'static str,
        value: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            section,
            field,
            value,
            message: message.into(),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn messages_name_the_offending_field() {
        let err = ConfigError::invalid_field(
            "builder",
            "thread_priority",
            Some("42".into()),
            "out of range",
        );
        assert_eq!(
            err.to_string(),
            "invalid value for 'thread_priority' in 'builder': out of range"
        );

        let conflict = ConfigError::InvalidConfiguration {
            field: "allow_non_default_network_usage",
            message: "requires path degradation migration",
        };
        assert!(conflict.to_string().contains("allow_non_default_network_usage"));
    }

    #[test]
    fn settings_error_preserves_source() {
        let Err(source) = serde_json::from_str::<serde_json::Value>("{") else {
            panic!("expected invalid json");
        };
        let err = ConfigError::Settings { source };
        assert!(err.source().is_some());
    }
}
