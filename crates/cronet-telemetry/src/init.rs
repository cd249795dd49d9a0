//! Logging initialisation primitives and configuration.
//!
//! # Design
//! - Centralises logging setup (fmt or JSON) with a single entry point.
//! - `RUST_LOG` wins over the configured level.

use cronet_config::TelemetrySettings;
use cronet_config::settings::DEFAULT_LOG_LEVEL;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the tracing subscriber cannot be installed (for example,
/// because another subscriber has already been set globally).
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_env_filter(config.level);
    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Log level string (e.g., `info`, `debug`).
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
        }
    }
}

impl<'a> From<&'a TelemetrySettings> for LoggingConfig<'a> {
    fn from(settings: &'a TelemetrySettings) -> Self {
        Self {
            level: &settings.log_level,
            format: log_format_from_config(settings).unwrap_or_else(LogFormat::infer),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable, pretty-printed logs.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Derive the log format from telemetry settings; unknown names fall back to `infer()`.
#[must_use]
pub fn log_format_from_config(settings: &TelemetrySettings) -> Option<LogFormat> {
    settings.log_format.as_deref().map(|value| match value {
        "json" => LogFormat::Json,
        "pretty" => LogFormat::Pretty,
        _ => LogFormat::infer(),
    })
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_follows_settings() {
        let mut settings = TelemetrySettings::default();
        assert_eq!(log_format_from_config(&settings), None);

        settings.log_format = Some("json".to_string());
        assert_eq!(log_format_from_config(&settings), Some(LogFormat::Json));
        settings.log_format = Some("pretty".to_string());
        assert_eq!(log_format_from_config(&settings), Some(LogFormat::Pretty));
        settings.log_format = Some("xml".to_string());
        assert_eq!(log_format_from_config(&settings), Some(LogFormat::infer()));
    }

    #[test]
    fn logging_config_borrows_settings() {
        let settings = TelemetrySettings {
            log_level: "debug".to_string(),
            log_format: Some("json".to_string()),
            ..TelemetrySettings::default()
        };
        let config = LoggingConfig::from(&settings);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(LoggingConfig::default().level, DEFAULT_LOG_LEVEL);
    }
}
