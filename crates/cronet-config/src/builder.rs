//! Engine configuration builder and the immutable configuration it produces.
//!
//! # Design
//! - Scalar setters validate eagerly, at the call site, so errors surface where the bad value
//!   was supplied.
//! - Structured option objects are recorded as `OptionPatch` values and only applied by
//!   `build()`, in the order their setters were called.
//! - `build()` consumes the builder; the resulting `EngineConfig` is read-only.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::ExperimentalOptionsDocument;
use crate::error::{ConfigError, ConfigResult};
use crate::options::{ConnectionMigrationOptions, DnsOptions, QuicOptions};
use crate::patch::{OptionPatch, apply_all};
use crate::validate::{
    PIN_SHA256_LEN, dedup_pins, ensure_quic_hint_host, ensure_storage_directory,
    ensure_thread_priority, pin_host_to_ascii,
};

/// Storage backing of the HTTP cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpCacheType {
    /// No cache.
    Disabled,
    /// On-disk cache under the storage path.
    Disk,
    /// In-memory cache.
    Memory,
}

/// HTTP cache modes selectable on the builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpCacheMode {
    /// Caching disabled.
    #[default]
    Disabled,
    /// Disk cache holding HTTP content.
    Disk,
    /// Disk cache for metadata only; HTTP content is not cached.
    DiskNoHttp,
    /// In-memory cache holding HTTP content.
    Memory,
}

impl HttpCacheMode {
    /// Storage backing required by the mode.
    #[must_use]
    pub const fn storage_type(self) -> HttpCacheType {
        match self {
            Self::Disabled => HttpCacheType::Disabled,
            Self::Disk | Self::DiskNoHttp => HttpCacheType::Disk,
            Self::Memory => HttpCacheType::Memory,
        }
    }

    /// Whether HTTP response content is cached.
    #[must_use]
    pub const fn content_cache_enabled(self) -> bool {
        matches!(self, Self::Disk | Self::Memory)
    }

    /// Encoding used by the engine-created telemetry atom.
    #[must_use]
    pub const fn proto_value(self) -> i32 {
        match self {
            Self::Disabled => 0,
            Self::Disk => 1,
            Self::DiskNoHttp => 2,
            Self::Memory => 3,
        }
    }
}

/// Hint that a host supports QUIC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuicHint {
    /// Host name.
    pub host: String,
    /// Port of the server that supports QUIC.
    pub port: u16,
    /// Alternate protocol port.
    pub alternate_port: u16,
}

/// Public key pins for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyPin {
    /// ASCII-compatible host name.
    pub host: String,
    /// Unique SHA-256 digests of the pinned keys.
    pub hashes: Vec<[u8; PIN_SHA256_LEN]>,
    /// Whether the pin also applies to subdomains.
    pub include_subdomains: bool,
    /// When the pin expires.
    pub expiration: SystemTime,
}

/// Accumulates engine settings and option patches.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct EngineConfigBuilder {
    user_agent: Option<String>,
    storage_path: Option<PathBuf>,
    quic_enabled: bool,
    http2_enabled: bool,
    brotli_enabled: bool,
    http_cache_mode: HttpCacheMode,
    http_cache_max_size: u64,
    quic_hints: Vec<QuicHint>,
    public_key_pins: Vec<PublicKeyPin>,
    pkp_bypass_for_local_trust_anchors: bool,
    network_quality_estimator_enabled: bool,
    thread_priority: Option<i32>,
    initialization_ref: Option<i64>,
    experimental_options: Option<String>,
    patches: Vec<OptionPatch>,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            storage_path: None,
            quic_enabled: true,
            http2_enabled: true,
            brotli_enabled: false,
            http_cache_mode: HttpCacheMode::Disabled,
            http_cache_max_size: 0,
            quic_hints: Vec::new(),
            public_key_pins: Vec::new(),
            pkp_bypass_for_local_trust_anchors: true,
            network_quality_estimator_enabled: false,
            thread_priority: None,
            initialization_ref: None,
            experimental_options: None,
            patches: Vec::new(),
        }
    }
}

impl EngineConfigBuilder {
    /// Builder with QUIC and HTTP/2 enabled, Brotli and the HTTP cache disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Directory for the disk cache and persisted state.
    ///
    /// # Errors
    ///
    /// Returns an error unless `path` is an existing directory.
    pub fn storage_path(mut self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        ensure_storage_directory(path)?;
        self.storage_path = Some(path.to_path_buf());
        Ok(self)
    }

    /// Enable or disable QUIC.
    #[must_use]
    pub const fn enable_quic(mut self, enabled: bool) -> Self {
        self.quic_enabled = enabled;
        self
    }

    /// Enable or disable HTTP/2.
    #[must_use]
    pub const fn enable_http2(mut self, enabled: bool) -> Self {
        self.http2_enabled = enabled;
        self
    }

    /// Enable or disable Brotli content decoding.
    #[must_use]
    pub const fn enable_brotli(mut self, enabled: bool) -> Self {
        self.brotli_enabled = enabled;
        self
    }

    /// Select the HTTP cache mode and its maximum size in bytes.
    ///
    /// # Errors
    ///
    /// Disk-backed modes require the storage path to have been set first.
    pub fn http_cache(mut self, mode: HttpCacheMode, max_size: u64) -> ConfigResult<Self> {
        if mode.storage_type() == HttpCacheType::Disk && self.storage_path.is_none() {
            return Err(ConfigError::invalid_field(
                "builder",
                "http_cache_mode",
                Some(format!("{mode:?}")),
                "storage path must be set",
            ));
        }
        self.http_cache_mode = mode;
        self.http_cache_max_size = max_size;
        Ok(self)
    }

    /// Declare that `host:port` speaks QUIC on `alternate_port`.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` contains a path separator.
    pub fn add_quic_hint(
        mut self,
        host: impl Into<String>,
        port: u16,
        alternate_port: u16,
    ) -> ConfigResult<Self> {
        let host = host.into();
        ensure_quic_hint_host(&host)?;
        self.quic_hints.push(QuicHint {
            host,
            port,
            alternate_port,
        });
        Ok(self)
    }

    /// Pin the SHA-256 digests of `host`'s public keys until `expiration`.
    ///
    /// # Errors
    ///
    /// Returns an error for digit-only, over-long or non-IDNA host names and for pins that
    /// are not 32 bytes long.
    pub fn add_public_key_pins<I>(
        mut self,
        host: &str,
        pins_sha256: I,
        include_subdomains: bool,
        expiration: SystemTime,
    ) -> ConfigResult<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let host = pin_host_to_ascii(host)?;
        let hashes = dedup_pins(pins_sha256)?;
        self.public_key_pins.push(PublicKeyPin {
            host,
            hashes,
            include_subdomains,
            expiration,
        });
        Ok(self)
    }

    /// Allow pins to be bypassed for locally installed trust anchors.
    #[must_use]
    pub const fn enable_public_key_pinning_bypass_for_local_trust_anchors(
        mut self,
        enabled: bool,
    ) -> Self {
        self.pkp_bypass_for_local_trust_anchors = enabled;
        self
    }

    /// Enable or disable the network quality estimator.
    #[must_use]
    pub const fn enable_network_quality_estimator(mut self, enabled: bool) -> Self {
        self.network_quality_estimator_enabled = enabled;
        self
    }

    /// Priority of the network thread, from -20 (highest) to 19 (lowest).
    ///
    /// # Errors
    ///
    /// Returns an error when `priority` is out of range.
    pub fn thread_priority(mut self, priority: i32) -> ConfigResult<Self> {
        ensure_thread_priority(priority)?;
        self.thread_priority = Some(priority);
        Ok(self)
    }

    /// Correlates builder, creation and initialization telemetry for one engine.
    #[must_use]
    pub const fn initialization_ref(mut self, initialization_ref: i64) -> Self {
        self.initialization_ref = Some(initialization_ref);
        self
    }

    /// Initialization reference set so far, if any.
    #[must_use]
    pub const fn pending_initialization_ref(&self) -> Option<i64> {
        self.initialization_ref
    }

    /// Raw experimental options JSON used as the base document.
    #[must_use]
    pub fn experimental_options(mut self, options: impl Into<String>) -> Self {
        self.experimental_options = Some(options.into());
        self
    }

    /// Record QUIC options to be written into the experimental options.
    #[must_use]
    pub fn quic_options(mut self, options: QuicOptions) -> Self {
        self.patches.push(OptionPatch::Quic(options));
        self
    }

    /// Record DNS options to be written into the experimental options.
    #[must_use]
    pub fn dns_options(mut self, options: DnsOptions) -> Self {
        self.patches.push(OptionPatch::Dns(options));
        self
    }

    /// Record connection migration options to be written into the experimental options.
    #[must_use]
    pub fn connection_migration_options(mut self, options: ConnectionMigrationOptions) -> Self {
        self.patches.push(OptionPatch::Migration(options));
        self
    }

    /// Patches recorded so far, in application order.
    #[must_use]
    pub fn patches(&self) -> &[OptionPatch] {
        &self.patches
    }

    /// Apply every recorded patch and freeze the configuration.
    ///
    /// Without patches the raw experimental options text is handed through untouched so the
    /// engine can reject malformed input itself.
    ///
    /// # Errors
    ///
    /// Returns the first patch failure; no configuration is produced in that case.
    pub fn build(self) -> ConfigResult<EngineConfig> {
        let raw = self.experimental_options.unwrap_or_default();
        let (experimental_options, experimental_options_text) = if self.patches.is_empty() {
            (ExperimentalOptionsDocument::parse(&raw), raw)
        } else {
            let mut document = ExperimentalOptionsDocument::parse(&raw);
            apply_all(&self.patches, &mut document).inspect_err(|err| {
                warn!(error = %err, "rejecting engine configuration");
            })?;
            let text = document.to_serialized_form();
            debug!(
                patches = self.patches.len(),
                "experimental options patched"
            );
            (document, text)
        };

        Ok(EngineConfig {
            user_agent: self.user_agent,
            storage_path: self.storage_path,
            quic_enabled: self.quic_enabled,
            http2_enabled: self.http2_enabled,
            brotli_enabled: self.brotli_enabled,
            http_cache_mode: self.http_cache_mode,
            http_cache_max_size: self.http_cache_max_size,
            quic_hints: self.quic_hints,
            public_key_pins: self.public_key_pins,
            pkp_bypass_for_local_trust_anchors: self.pkp_bypass_for_local_trust_anchors,
            network_quality_estimator_enabled: self.network_quality_estimator_enabled,
            thread_priority: self.thread_priority,
            initialization_ref: self.initialization_ref,
            experimental_options,
            experimental_options_text,
        })
    }
}

/// Frozen engine configuration produced by `EngineConfigBuilder::build`.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EngineConfig {
    user_agent: Option<String>,
    storage_path: Option<PathBuf>,
    quic_enabled: bool,
    http2_enabled: bool,
    brotli_enabled: bool,
    http_cache_mode: HttpCacheMode,
    http_cache_max_size: u64,
    quic_hints: Vec<QuicHint>,
    public_key_pins: Vec<PublicKeyPin>,
    pkp_bypass_for_local_trust_anchors: bool,
    network_quality_estimator_enabled: bool,
    thread_priority: Option<i32>,
    initialization_ref: Option<i64>,
    experimental_options: ExperimentalOptionsDocument,
    experimental_options_text: String,
}

impl EngineConfig {
    /// `User-Agent` override, if any.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Storage directory, if any.
    #[must_use]
    pub fn storage_path(&self) -> Option<&Path> {
        self.storage_path.as_deref()
    }

    /// Whether QUIC is enabled.
    #[must_use]
    pub const fn quic_enabled(&self) -> bool {
        self.quic_enabled
    }

    /// Whether HTTP/2 is enabled.
    #[must_use]
    pub const fn http2_enabled(&self) -> bool {
        self.http2_enabled
    }

    /// Whether Brotli decoding is enabled.
    #[must_use]
    pub const fn brotli_enabled(&self) -> bool {
        self.brotli_enabled
    }

    /// Selected HTTP cache mode.
    #[must_use]
    pub const fn http_cache_mode(&self) -> HttpCacheMode {
        self.http_cache_mode
    }

    /// Maximum HTTP cache size in bytes.
    #[must_use]
    pub const fn http_cache_max_size(&self) -> u64 {
        self.http_cache_max_size
    }

    /// Whether the HTTP cache stores response content.
    #[must_use]
    pub const fn cache_disabled(&self) -> bool {
        !self.http_cache_mode.content_cache_enabled()
    }

    /// QUIC hints in insertion order.
    #[must_use]
    pub fn quic_hints(&self) -> &[QuicHint] {
        &self.quic_hints
    }

    /// Public key pins in insertion order.
    #[must_use]
    pub fn public_key_pins(&self) -> &[PublicKeyPin] {
        &self.public_key_pins
    }

    /// Whether pins may be bypassed for local trust anchors.
    #[must_use]
    pub const fn pkp_bypass_for_local_trust_anchors(&self) -> bool {
        self.pkp_bypass_for_local_trust_anchors
    }

    /// Whether the network quality estimator is enabled.
    #[must_use]
    pub const fn network_quality_estimator_enabled(&self) -> bool {
        self.network_quality_estimator_enabled
    }

    /// Thread priority supplied by the caller, if any.
    #[must_use]
    pub const fn thread_priority(&self) -> Option<i32> {
        self.thread_priority
    }

    /// Thread priority supplied by the caller, or `default` when none was set.
    #[must_use]
    pub fn thread_priority_or(&self, default: i32) -> i32 {
        self.thread_priority.unwrap_or(default)
    }

    /// Initialization reference, `0` when the caller never set one.
    #[must_use]
    pub fn initialization_ref(&self) -> i64 {
        self.initialization_ref.unwrap_or_default()
    }

    /// Experimental options document after patching.
    #[must_use]
    pub const fn experimental_options(&self) -> &ExperimentalOptionsDocument {
        &self.experimental_options
    }

    /// Experimental options text handed to the engine.
    #[must_use]
    pub fn experimental_options_text(&self) -> &str {
        &self.experimental_options_text
    }
}
