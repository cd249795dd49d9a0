//! JSON settings documents that drive the engine builder.
//!
//! # Design
//! - Durations are integer fields with their unit in the name; tri-state toggles are
//!   `Option<bool>` and map onto `OptionValue`.
//! - `apply_to` goes through the builder setters so validation happens at the same call sites
//!   as programmatic configuration.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::builder::{EngineConfigBuilder, HttpCacheMode};
use crate::error::{ConfigError, ConfigResult};
use crate::options::{ConnectionMigrationOptions, DnsOptions, QuicOptions, StaleDnsOptions};

/// Default telemetry sampling rate.
pub const DEFAULT_SAMPLES_PER_SECOND: u32 = 1;
/// Default log level when neither settings nor `RUST_LOG` provide one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Engine settings as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// `User-Agent` override.
    pub user_agent: Option<String>,
    /// Storage directory for caches and persisted state.
    pub storage_path: Option<PathBuf>,
    /// QUIC toggle.
    pub enable_quic: Option<bool>,
    /// HTTP/2 toggle.
    pub enable_http2: Option<bool>,
    /// Brotli toggle.
    pub enable_brotli: Option<bool>,
    /// HTTP cache selection.
    pub http_cache: Option<HttpCacheSettings>,
    /// QUIC hints.
    pub quic_hints: Vec<QuicHintSettings>,
    /// Public key pins.
    pub public_key_pins: Vec<PublicKeyPinSettings>,
    /// Pinning bypass for local trust anchors.
    pub pkp_bypass_for_local_trust_anchors: Option<bool>,
    /// Network quality estimator toggle.
    pub enable_network_quality_estimator: Option<bool>,
    /// Network thread priority.
    pub thread_priority: Option<i32>,
    /// Experimental options, either a JSON object or its text form.
    pub experimental_options: Option<Value>,
    /// QUIC options patch.
    pub quic: Option<QuicSettings>,
    /// DNS options patch.
    pub dns: Option<DnsSettings>,
    /// Connection migration options patch.
    pub connection_migration: Option<MigrationSettings>,
    /// Telemetry and logging settings.
    pub telemetry: TelemetrySettings,
}

/// HTTP cache section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpCacheSettings {
    /// Cache mode.
    pub mode: HttpCacheMode,
    /// Maximum size in bytes.
    #[serde(default)]
    pub max_size: u64,
}

/// One QUIC hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuicHintSettings {
    /// Host name.
    pub host: String,
    /// Origin port.
    pub port: u16,
    /// Alternate protocol port.
    pub alternate_port: u16,
}

/// Pins for one host; digests are base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicKeyPinSettings {
    /// Host name.
    pub host: String,
    /// Base64-encoded SHA-256 digests.
    pub pins_sha256: Vec<String>,
    /// Whether the pin covers subdomains.
    #[serde(default)]
    pub include_subdomains: bool,
    /// Expiration as seconds since the Unix epoch.
    pub expiration_unix_secs: u64,
}

/// QUIC options as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuicSettings {
    /// Hosts allowed to use QUIC.
    pub allowed_quic_hosts: Vec<String>,
    /// Handshake user agent.
    pub handshake_user_agent: Option<String>,
    /// Idle connection timeout in seconds.
    pub idle_connection_timeout_secs: Option<u64>,
}

/// DNS options as stored on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DnsSettings {
    /// Use the network stack's resolver.
    pub use_http_stack_dns_resolver: Option<bool>,
    /// Persist the host cache.
    pub persist_host_cache: Option<bool>,
    /// Serve stale host cache entries.
    pub enable_stale_dns: Option<bool>,
    /// Host cache persistence period in milliseconds.
    pub persist_host_cache_period_ms: Option<u64>,
    /// Race connections to stale results.
    pub preestablish_connections_to_stale_dns_results: Option<bool>,
    /// Stale DNS policy.
    pub stale_dns: Option<StaleDnsSettings>,
}

/// Stale DNS policy as stored on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaleDnsSettings {
    /// Fresh lookup timeout in milliseconds.
    pub fresh_lookup_timeout_ms: Option<u64>,
    /// Maximum expired delay in milliseconds.
    pub max_expired_delay_ms: Option<u64>,
    /// Allow results from other networks.
    pub allow_cross_network_usage: Option<bool>,
    /// Use stale results when the name does not resolve.
    pub use_stale_on_name_not_resolved: Option<bool>,
}

/// Connection migration options as stored on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationSettings {
    /// Migrate on default network change.
    pub default_network_migration: Option<bool>,
    /// Migrate on path degradation.
    pub path_degradation_migration: Option<bool>,
    /// Allow non-default networks.
    pub allow_non_default_network_usage: Option<bool>,
}

/// Telemetry sampling and logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetrySettings {
    /// Traffic samples accepted per second.
    pub samples_per_second: u32,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// `json` or `pretty`; inferred from the build profile when absent.
    pub log_format: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            samples_per_second: DEFAULT_SAMPLES_PER_SECOND,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: None,
        }
    }
}

impl EngineSettings {
    /// Decode settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Settings` when the text is not a valid settings document.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        serde_json::from_str(text).map_err(|source| ConfigError::Settings { source })
    }

    /// Read and decode a settings file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` when the file cannot be read and `ConfigError::Settings` when
    /// it cannot be decoded.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            operation: "settings.read",
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&text)?;
        debug!(path = %path.display(), "loaded engine settings");
        Ok(settings)
    }

    /// Apply every configured value to `builder` through its setters.
    ///
    /// # Errors
    ///
    /// Propagates setter validation failures and rejects pins that are not valid base64.
    pub fn apply_to(&self, builder: EngineConfigBuilder) -> ConfigResult<EngineConfigBuilder> {
        let mut builder = builder;
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if let Some(path) = &self.storage_path {
            builder = builder.storage_path(path)?;
        }
        if let Some(enabled) = self.enable_quic {
            builder = builder.enable_quic(enabled);
        }
        if let Some(enabled) = self.enable_http2 {
            builder = builder.enable_http2(enabled);
        }
        if let Some(enabled) = self.enable_brotli {
            builder = builder.enable_brotli(enabled);
        }
        if let Some(cache) = self.http_cache {
            builder = builder.http_cache(cache.mode, cache.max_size)?;
        }
        for hint in &self.quic_hints {
            builder = builder.add_quic_hint(hint.host.clone(), hint.port, hint.alternate_port)?;
        }
        for pin in &self.public_key_pins {
            let digests = decode_pins(&pin.pins_sha256)?;
            let expiration = pin_expiration(pin.expiration_unix_secs)?;
            builder = builder.add_public_key_pins(
                &pin.host,
                digests,
                pin.include_subdomains,
                expiration,
            )?;
        }
        if let Some(enabled) = self.pkp_bypass_for_local_trust_anchors {
            builder = builder.enable_public_key_pinning_bypass_for_local_trust_anchors(enabled);
        }
        if let Some(enabled) = self.enable_network_quality_estimator {
            builder = builder.enable_network_quality_estimator(enabled);
        }
        if let Some(priority) = self.thread_priority {
            builder = builder.thread_priority(priority)?;
        }
        match &self.experimental_options {
            Some(Value::String(text)) => builder = builder.experimental_options(text.clone()),
            Some(value) => builder = builder.experimental_options(value.to_string()),
            None => {}
        }
        if let Some(quic) = &self.quic {
            builder = builder.quic_options(quic.clone().into());
        }
        if let Some(dns) = self.dns {
            builder = builder.dns_options(dns.into());
        }
        if let Some(migration) = self.connection_migration {
            builder = builder.connection_migration_options(migration.into());
        }
        Ok(builder)
    }
}

fn pin_expiration(unix_secs: u64) -> ConfigResult<SystemTime> {
    SystemTime::UNIX_EPOCH
        .checked_add(Duration::from_secs(unix_secs))
        .ok_or_else(|| {
            ConfigError::invalid_field(
                "settings",
                "public_key_pins.expiration_unix_secs",
                Some(unix_secs.to_string()),
                "expiration is not representable",
            )
        })
}

fn decode_pins(encoded: &[String]) -> ConfigResult<Vec<Vec<u8>>> {
    encoded
        .iter()
        .map(|pin| {
            general_purpose::STANDARD.decode(pin).map_err(|err| {
                ConfigError::invalid_field(
                    "settings",
                    "public_key_pins.pins_sha256",
                    Some(pin.clone()),
                    err.to_string(),
                )
            })
        })
        .collect()
}

impl From<QuicSettings> for QuicOptions {
    fn from(settings: QuicSettings) -> Self {
        Self {
            allowed_quic_hosts: settings.allowed_quic_hosts,
            handshake_user_agent: settings.handshake_user_agent,
            idle_connection_timeout: settings.idle_connection_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl From<StaleDnsSettings> for StaleDnsOptions {
    fn from(settings: StaleDnsSettings) -> Self {
        Self {
            fresh_lookup_timeout: settings.fresh_lookup_timeout_ms.map(Duration::from_millis),
            max_expired_delay: settings.max_expired_delay_ms.map(Duration::from_millis),
            allow_cross_network_usage: settings.allow_cross_network_usage.into(),
            use_stale_on_name_not_resolved: settings.use_stale_on_name_not_resolved.into(),
        }
    }
}

impl From<DnsSettings> for DnsOptions {
    fn from(settings: DnsSettings) -> Self {
        Self {
            use_http_stack_dns_resolver: settings.use_http_stack_dns_resolver.into(),
            persist_host_cache: settings.persist_host_cache.into(),
            enable_stale_dns: settings.enable_stale_dns.into(),
            persist_host_cache_period: settings
                .persist_host_cache_period_ms
                .map(Duration::from_millis),
            preestablish_connections_to_stale_dns_results: settings
                .preestablish_connections_to_stale_dns_results
                .into(),
            stale_dns_options: settings.stale_dns.map(Into::into),
        }
    }
}

impl From<MigrationSettings> for ConnectionMigrationOptions {
    fn from(settings: MigrationSettings) -> Self {
        Self {
            default_network_migration: settings.default_network_migration.into(),
            path_degradation_migration: settings.path_degradation_migration.into(),
            allow_non_default_network_usage: settings.allow_non_default_network_usage.into(),
        }
    }
}
