//! Telemetry event payloads and the inputs they are derived from.
//!
//! # Design
//! - Events are plain serializable records; formatting for a destination is the sink's job.
//! - Experimental options are decoded once into a typed snapshot: absent or mistyped integers
//!   become `-1`, absent or mistyped booleans become `OptionValue::Unset`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use cronet_config::validate::THREAD_PRIORITY_LOWEST;
use cronet_config::{
    ASYNC_DNS_SECTION, EngineConfig, ExperimentalOptionsDocument, OptionValue, QUIC_SECTION,
    STALE_DNS_SECTION, filter_connection_options,
};
use serde::Serialize;

use crate::buckets::SizeBucketer;
use crate::error::TelemetryError;
use crate::hash::protocol_hash;

/// Reported for integer options that are absent from the document.
pub const UNSET_INT_VALUE: i32 = -1;
/// Reported when the caller never chose a network thread priority.
pub const UNSET_THREAD_PRIORITY: i32 = THREAD_PRIORITY_LOWEST + 1;

/// Four-part engine version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineVersion {
    /// Major version.
    pub major: i32,
    /// Minor version.
    pub minor: i32,
    /// Build number.
    pub build: i32,
    /// Patch number.
    pub patch: i32,
}

impl EngineVersion {
    /// Parse `major.minor.build.patch`.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::InvalidVersion` unless the text has exactly four integer parts.
    pub fn parse(text: &str) -> Result<Self, TelemetryError> {
        let invalid = || TelemetryError::InvalidVersion {
            value: text.to_string(),
        };
        let mut parts = text.split('.').map(|part| part.parse::<i32>());
        let mut next = || parts.next().and_then(Result::ok).ok_or_else(invalid);
        let version = Self {
            major: next()?,
            minor: next()?,
            build: next()?,
            patch: next()?,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }

    /// Extract the version from a product string such as `Cronet/120.0.6099.4@a1b2c3d4`.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::InvalidVersion` when no four-part version can be found.
    pub fn from_version_string(text: &str) -> Result<Self, TelemetryError> {
        let without_product = text.split_once('/').map_or(text, |(_, rest)| rest);
        let without_hash = without_product
            .split_once('@')
            .map_or(without_product, |(version, _)| version);
        Self::parse(without_hash).map_err(|_| TelemetryError::InvalidVersion {
            value: text.to_string(),
        })
    }
}

impl FromStr for EngineVersion {
    type Err = TelemetryError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl Display for EngineVersion {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.patch
        )
    }
}

/// Where the engine implementation was loaded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineSource {
    /// Unknown origin.
    #[default]
    Unspecified,
    /// Linked into the application.
    StaticallyLinked,
    /// Provided by platform services.
    PlayServices,
    /// Fallback implementation without the native stack.
    Fallback,
}

impl EngineSource {
    /// Encoding used by the engine-created atom.
    #[must_use]
    pub const fn proto_value(self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::StaticallyLinked => 1,
            Self::PlayServices => 2,
            Self::Fallback => 3,
        }
    }
}

/// Which engine builder API the application used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderAuthor {
    /// Unknown builder.
    #[default]
    Unspecified,
    /// The public API builder.
    Api,
    /// The implementation's own builder.
    Impl,
}

impl BuilderAuthor {
    /// Encoding used by the builder-initialized atom.
    #[must_use]
    pub const fn proto_value(self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::Api => 1,
            Self::Impl => 2,
        }
    }
}

/// Builder-side measurements taken while an engine was being constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineBuilderInitializedInfo {
    /// Correlates this report with the matching engine-created event.
    pub initialization_ref: i64,
    /// Builder API that produced the engine.
    pub author: BuilderAuthor,
    /// Time spent creating the builder.
    pub builder_created_latency: Duration,
    /// Engine implementation origin.
    pub source: EngineSource,
    /// `None` when creation was never attempted.
    pub creation_successful: Option<bool>,
    /// Version of the API the application compiled against.
    pub api_version: EngineVersion,
    /// Version of the loaded implementation.
    pub impl_version: EngineVersion,
    /// Application uid.
    pub uid: i32,
}

/// Emitted once per engine build attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineBuilderInitializedEvent {
    /// Correlates this report with the matching engine-created event.
    pub initialization_ref: i64,
    /// Builder API encoding.
    pub author: i32,
    /// Builder latency in milliseconds, saturating.
    pub builder_created_latency_ms: i32,
    /// Engine implementation origin.
    pub source: EngineSource,
    /// Whether creation succeeded.
    pub creation_successful: OptionValue,
    /// API version.
    pub api_version: EngineVersion,
    /// Implementation version.
    pub impl_version: EngineVersion,
    /// Application uid.
    pub uid: i32,
}

impl From<&EngineBuilderInitializedInfo> for EngineBuilderInitializedEvent {
    fn from(info: &EngineBuilderInitializedInfo) -> Self {
        Self {
            initialization_ref: info.initialization_ref,
            author: info.author.proto_value(),
            builder_created_latency_ms: millis_i32(info.builder_created_latency),
            source: info.source,
            creation_successful: info.creation_successful.into(),
            api_version: info.api_version,
            impl_version: info.impl_version,
            uid: info.uid,
        }
    }
}

/// Timings reported once the engine finished its asynchronous start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineInitializedInfo {
    /// Correlates this report with the matching engine-created event.
    pub initialization_ref: i64,
    /// Time spent in the synchronous part of engine creation.
    pub engine_creation_latency: Duration,
    /// Time spent in the asynchronous part of engine start-up.
    pub engine_async_latency: Duration,
    /// Time spent loading runtime flags.
    pub http_flags_latency: Duration,
    /// `None` when flags were never loaded.
    pub http_flags_successful: Option<bool>,
    /// Hashed names of the runtime flags that were applied.
    pub http_flags_names: Vec<i64>,
    /// Values of the runtime flags, parallel to `http_flags_names`.
    pub http_flags_values: Vec<i64>,
}

/// Emitted once the engine has finished initializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineInitializedEvent {
    /// Correlates this report with the matching engine-created event.
    pub initialization_ref: i64,
    /// Synchronous creation latency in milliseconds, saturating.
    pub engine_creation_latency_ms: i32,
    /// Asynchronous start-up latency in milliseconds, saturating.
    pub engine_async_latency_ms: i32,
    /// Flag loading latency in milliseconds, saturating.
    pub http_flags_latency_ms: i32,
    /// Whether flags loaded.
    pub http_flags_successful: OptionValue,
    /// Hashed flag names.
    pub http_flags_names: Vec<i64>,
    /// Flag values.
    pub http_flags_values: Vec<i64>,
}

impl From<&EngineInitializedInfo> for EngineInitializedEvent {
    fn from(info: &EngineInitializedInfo) -> Self {
        Self {
            initialization_ref: info.initialization_ref,
            engine_creation_latency_ms: millis_i32(info.engine_creation_latency),
            engine_async_latency_ms: millis_i32(info.engine_async_latency),
            http_flags_latency_ms: millis_i32(info.http_flags_latency),
            http_flags_successful: info.http_flags_successful.into(),
            http_flags_names: info.http_flags_names.clone(),
            http_flags_values: info.http_flags_values.clone(),
        }
    }
}

/// Typed view of the experimental options reported at engine creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentalOptionsSnapshot {
    /// Known QUIC connection option tags, original spelling kept.
    pub quic_connection_options: Option<String>,
    /// `QUIC.store_server_configs_in_properties`.
    pub quic_store_server_configs_in_properties: OptionValue,
    /// `QUIC.max_server_configs_stored_in_properties`.
    pub quic_max_server_configs_stored_in_properties: i32,
    /// `QUIC.idle_connection_timeout_seconds`.
    pub quic_idle_connection_timeout_seconds: i32,
    /// `QUIC.goaway_sessions_on_ip_change`.
    pub quic_goaway_sessions_on_ip_change: OptionValue,
    /// `QUIC.close_sessions_on_ip_change`.
    pub quic_close_sessions_on_ip_change: OptionValue,
    /// `QUIC.migrate_sessions_on_network_change_v2`.
    pub quic_migrate_sessions_on_network_change_v2: OptionValue,
    /// `QUIC.migrate_sessions_early_v2`.
    pub quic_migrate_sessions_early_v2: OptionValue,
    /// `QUIC.disable_bidirectional_streams`.
    pub quic_disable_bidirectional_streams: OptionValue,
    /// `QUIC.max_time_before_crypto_handshake_seconds`.
    pub quic_max_time_before_crypto_handshake_seconds: i32,
    /// `QUIC.max_idle_time_before_crypto_handshake_seconds`.
    pub quic_max_idle_time_before_crypto_handshake_seconds: i32,
    /// `QUIC.enable_socket_recv_optimization`.
    pub quic_enable_socket_recv_optimization: OptionValue,
    /// `AsyncDNS.enable`.
    pub async_dns_enable: OptionValue,
    /// `StaleDNS.enable`.
    pub stale_dns_enable: OptionValue,
    /// `StaleDNS.delay_ms`.
    pub stale_dns_delay_ms: i32,
    /// `StaleDNS.max_expired_time_ms`.
    pub stale_dns_max_expired_time_ms: i32,
    /// `StaleDNS.max_stale_uses`.
    pub stale_dns_max_stale_uses: i32,
    /// `StaleDNS.allow_other_network`.
    pub stale_dns_allow_other_network: OptionValue,
    /// `StaleDNS.persist_to_disk`.
    pub stale_dns_persist_to_disk: OptionValue,
    /// `StaleDNS.persist_delay_ms`.
    pub stale_dns_persist_delay_ms: i32,
    /// `StaleDNS.use_stale_on_name_not_resolved`.
    pub stale_dns_use_stale_on_name_not_resolved: OptionValue,
    /// Top-level `disable_ipv6_on_wifi`.
    pub disable_ipv6_on_wifi: OptionValue,
}

impl ExperimentalOptionsSnapshot {
    /// Decode the reported fields out of `document`.
    #[must_use]
    pub fn decode(document: &ExperimentalOptionsDocument) -> Self {
        let flag = |section: &str, key: &str| OptionValue::from(document.get::<bool>(section, key));
        let int =
            |section: &str, key: &str| document.get_or_default(section, key, UNSET_INT_VALUE);
        let connection_options = document.get::<String>(QUIC_SECTION, "connection_options");

        Self {
            quic_connection_options: filter_connection_options(connection_options.as_deref()),
            quic_store_server_configs_in_properties: flag(
                QUIC_SECTION,
                "store_server_configs_in_properties",
            ),
            quic_max_server_configs_stored_in_properties: int(
                QUIC_SECTION,
                "max_server_configs_stored_in_properties",
            ),
            quic_idle_connection_timeout_seconds: int(
                QUIC_SECTION,
                "idle_connection_timeout_seconds",
            ),
            quic_goaway_sessions_on_ip_change: flag(QUIC_SECTION, "goaway_sessions_on_ip_change"),
            quic_close_sessions_on_ip_change: flag(QUIC_SECTION, "close_sessions_on_ip_change"),
            quic_migrate_sessions_on_network_change_v2: flag(
                QUIC_SECTION,
                "migrate_sessions_on_network_change_v2",
            ),
            quic_migrate_sessions_early_v2: flag(QUIC_SECTION, "migrate_sessions_early_v2"),
            quic_disable_bidirectional_streams: flag(
                QUIC_SECTION,
                "disable_bidirectional_streams",
            ),
            quic_max_time_before_crypto_handshake_seconds: int(
                QUIC_SECTION,
                "max_time_before_crypto_handshake_seconds",
            ),
            quic_max_idle_time_before_crypto_handshake_seconds: int(
                QUIC_SECTION,
                "max_idle_time_before_crypto_handshake_seconds",
            ),
            quic_enable_socket_recv_optimization: flag(
                QUIC_SECTION,
                "enable_socket_recv_optimization",
            ),
            async_dns_enable: flag(ASYNC_DNS_SECTION, "enable"),
            stale_dns_enable: flag(STALE_DNS_SECTION, "enable"),
            stale_dns_delay_ms: int(STALE_DNS_SECTION, "delay_ms"),
            stale_dns_max_expired_time_ms: int(STALE_DNS_SECTION, "max_expired_time_ms"),
            stale_dns_max_stale_uses: int(STALE_DNS_SECTION, "max_stale_uses"),
            stale_dns_allow_other_network: flag(STALE_DNS_SECTION, "allow_other_network"),
            stale_dns_persist_to_disk: flag(STALE_DNS_SECTION, "persist_to_disk"),
            stale_dns_persist_delay_ms: int(STALE_DNS_SECTION, "persist_delay_ms"),
            stale_dns_use_stale_on_name_not_resolved: flag(
                STALE_DNS_SECTION,
                "use_stale_on_name_not_resolved",
            ),
            disable_ipv6_on_wifi: document.top_level::<bool>("disable_ipv6_on_wifi").into(),
        }
    }
}

/// Emitted once per successfully created engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct EngineCreatedEvent {
    /// Engine correlation id.
    pub engine_id: i64,
    /// Engine implementation version.
    pub version: EngineVersion,
    /// Engine implementation origin.
    pub source: EngineSource,
    /// Brotli toggle.
    pub brotli_enabled: bool,
    /// HTTP/2 toggle.
    pub http2_enabled: bool,
    /// HTTP cache mode encoding.
    pub http_cache_mode: i32,
    /// Pinning bypass for local trust anchors.
    pub pkp_bypass_for_local_trust_anchors: bool,
    /// QUIC toggle.
    pub quic_enabled: bool,
    /// Network quality estimator toggle.
    pub network_quality_estimator_enabled: bool,
    /// Network thread priority, `UNSET_THREAD_PRIORITY` when not chosen.
    pub thread_priority: i32,
    /// Decoded experimental options.
    pub experimental_options: ExperimentalOptionsSnapshot,
    /// Correlates this event with the builder and initialization reports.
    pub initialization_ref: i64,
}

impl EngineCreatedEvent {
    /// Assemble the event from the frozen configuration.
    #[must_use]
    pub fn new(
        engine_id: i64,
        config: &EngineConfig,
        version: EngineVersion,
        source: EngineSource,
    ) -> Self {
        let options = ExperimentalOptionsDocument::parse(config.experimental_options_text());
        Self {
            engine_id,
            version,
            source,
            brotli_enabled: config.brotli_enabled(),
            http2_enabled: config.http2_enabled(),
            http_cache_mode: config.http_cache_mode().proto_value(),
            pkp_bypass_for_local_trust_anchors: config.pkp_bypass_for_local_trust_anchors(),
            quic_enabled: config.quic_enabled(),
            network_quality_estimator_enabled: config.network_quality_estimator_enabled(),
            thread_priority: config.thread_priority_or(UNSET_THREAD_PRIORITY),
            experimental_options: ExperimentalOptionsSnapshot::decode(&options),
            initialization_ref: config.initialization_ref(),
        }
    }
}

/// Per-request traffic measurements supplied by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrafficInfo {
    /// Request header bytes.
    pub request_header_size: u64,
    /// Request body bytes.
    pub request_body_size: u64,
    /// Response header bytes.
    pub response_header_size: u64,
    /// Response body bytes.
    pub response_body_size: u64,
    /// HTTP status code.
    pub response_status_code: i32,
    /// Negotiated protocol, empty when unknown.
    pub negotiated_protocol: String,
    /// Time until response headers arrived.
    pub headers_latency: Duration,
    /// Time until the request finished.
    pub total_latency: Duration,
    /// Whether a connection migration was attempted.
    pub connection_migration_attempted: bool,
    /// Whether the connection migration succeeded.
    pub connection_migration_succeeded: bool,
}

/// Emitted for each accepted traffic sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficReportedEvent {
    /// Engine correlation id.
    pub engine_id: i64,
    /// Request header size bucket.
    pub request_header_size_bucket: i32,
    /// Request body size bucket.
    pub request_body_size_bucket: i32,
    /// Response header size bucket.
    pub response_header_size_bucket: i32,
    /// Response body size bucket.
    pub response_body_size_bucket: i32,
    /// HTTP status code.
    pub response_status_code: i32,
    /// Hash of the negotiated protocol.
    pub negotiated_protocol_hash: i64,
    /// Header latency in milliseconds, saturating.
    pub headers_latency_ms: i32,
    /// Total latency in milliseconds, saturating.
    pub total_latency_ms: i32,
    /// Whether a connection migration was attempted.
    pub connection_migration_attempted: bool,
    /// Whether the connection migration succeeded.
    pub connection_migration_succeeded: bool,
    /// Samples dropped by the limiter since the previous accepted sample.
    pub samples_rate_limited: u32,
}

impl TrafficReportedEvent {
    /// Bucket and hash `info` for reporting.
    #[must_use]
    pub fn new(
        engine_id: i64,
        info: &TrafficInfo,
        buckets: &dyn SizeBucketer,
        samples_rate_limited: u32,
    ) -> Self {
        Self {
            engine_id,
            request_header_size_bucket: buckets.request_headers(info.request_header_size),
            request_body_size_bucket: buckets.request_body(info.request_body_size),
            response_header_size_bucket: buckets.response_headers(info.response_header_size),
            response_body_size_bucket: buckets.response_body(info.response_body_size),
            response_status_code: info.response_status_code,
            negotiated_protocol_hash: protocol_hash(&info.negotiated_protocol),
            headers_latency_ms: millis_i32(info.headers_latency),
            total_latency_ms: millis_i32(info.total_latency),
            connection_migration_attempted: info.connection_migration_attempted,
            connection_migration_succeeded: info.connection_migration_succeeded,
            samples_rate_limited,
        }
    }
}

fn millis_i32(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

/// Events handed to a `TelemetrySink`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// An engine was created.
    EngineCreated(EngineCreatedEvent),
    /// A traffic sample passed the limiter.
    TrafficReported(TrafficReportedEvent),
    /// An engine builder finished a build attempt.
    EngineBuilderInitialized(EngineBuilderInitializedEvent),
    /// An engine finished initializing.
    EngineInitialized(EngineInitializedEvent),
}

impl TelemetryEvent {
    /// Stable event kind label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EngineCreated(_) => "engine_created",
            Self::TrafficReported(_) => "traffic_reported",
            Self::EngineBuilderInitialized(_) => "engine_builder_initialized",
            Self::EngineInitialized(_) => "engine_initialized",
        }
    }

    /// Engine the event belongs to; initialization reports predate the engine id.
    #[must_use]
    pub const fn engine_id(&self) -> Option<i64> {
        match self {
            Self::EngineCreated(event) => Some(event.engine_id),
            Self::TrafficReported(event) => Some(event.engine_id),
            Self::EngineBuilderInitialized(_) | Self::EngineInitialized(_) => None,
        }
    }

    /// Initialization reference, when the event carries one.
    #[must_use]
    pub const fn initialization_ref(&self) -> Option<i64> {
        match self {
            Self::EngineCreated(event) => Some(event.initialization_ref),
            Self::EngineBuilderInitialized(event) => Some(event.initialization_ref),
            Self::EngineInitialized(event) => Some(event.initialization_ref),
            Self::TrafficReported(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buckets::DefaultSizeBucketer;
    use cronet_config::{ConnectionMigrationOptions, EngineConfigBuilder, HttpCacheMode};

    #[test]
    fn versions_parse_from_plain_and_product_strings() {
        let version = EngineVersion::parse("120.0.6099.4").expect("plain version");
        assert_eq!(
            version,
            EngineVersion {
                major: 120,
                minor: 0,
                build: 6099,
                patch: 4
            }
        );
        assert_eq!(version.to_string(), "120.0.6099.4");
        assert_eq!(
            EngineVersion::from_version_string("Cronet/120.0.6099.4@a1b2c3d4").expect("product"),
            version
        );
        assert_eq!("1.2.3.4".parse::<EngineVersion>().expect("from_str").patch, 4);
    }

    #[test]
    fn malformed_versions_are_rejected() {
        for text in ["", "1.2.3", "1.2.3.4.5", "1.x.3.4", "Cronet/1.2@hash"] {
            assert!(
                EngineVersion::from_version_string(text).is_err(),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn sources_use_proto_encoding() {
        assert_eq!(EngineSource::Unspecified.proto_value(), 0);
        assert_eq!(EngineSource::StaticallyLinked.proto_value(), 1);
        assert_eq!(EngineSource::PlayServices.proto_value(), 2);
        assert_eq!(EngineSource::Fallback.proto_value(), 3);
    }

    #[test]
    fn snapshot_decodes_known_fields_and_defaults_the_rest() {
        let document = ExperimentalOptionsDocument::parse(
            r#"{
                "QUIC": {
                    "connection_options": "CHLO,bogus,ALPN",
                    "max_server_configs_stored_in_properties": 4,
                    "goaway_sessions_on_ip_change": false,
                    "idle_connection_timeout_seconds": "30"
                },
                "AsyncDNS": {"enable": true},
                "StaleDNS": {"delay_ms": 250, "max_stale_uses": 9999999999},
                "disable_ipv6_on_wifi": true
            }"#,
        );
        let snapshot = ExperimentalOptionsSnapshot::decode(&document);
        assert_eq!(snapshot.quic_connection_options.as_deref(), Some("CHLO,ALPN"));
        assert_eq!(snapshot.quic_max_server_configs_stored_in_properties, 4);
        assert_eq!(snapshot.quic_goaway_sessions_on_ip_change, OptionValue::Disabled);
        assert_eq!(snapshot.quic_idle_connection_timeout_seconds, UNSET_INT_VALUE);
        assert_eq!(snapshot.quic_close_sessions_on_ip_change, OptionValue::Unset);
        assert_eq!(snapshot.async_dns_enable, OptionValue::Enabled);
        assert_eq!(snapshot.stale_dns_delay_ms, 250);
        assert_eq!(snapshot.stale_dns_max_stale_uses, UNSET_INT_VALUE);
        assert_eq!(snapshot.stale_dns_persist_delay_ms, UNSET_INT_VALUE);
        assert_eq!(snapshot.disable_ipv6_on_wifi, OptionValue::Enabled);
    }

    #[test]
    fn empty_document_decodes_to_unset_values() {
        let snapshot = ExperimentalOptionsSnapshot::decode(&ExperimentalOptionsDocument::new());
        assert_eq!(snapshot.quic_connection_options, None);
        assert_eq!(snapshot.stale_dns_enable, OptionValue::Unset);
        assert_eq!(snapshot.quic_max_time_before_crypto_handshake_seconds, -1);
        assert_eq!(snapshot.disable_ipv6_on_wifi, OptionValue::Unset);
    }

    #[test]
    fn engine_created_event_reflects_the_config() {
        let config = EngineConfigBuilder::new()
            .initialization_ref(5)
            .enable_brotli(true)
            .http_cache(HttpCacheMode::Memory, 1)
            .and_then(|builder| {
                builder
                    .connection_migration_options(ConnectionMigrationOptions {
                        default_network_migration: OptionValue::Enabled,
                        ..ConnectionMigrationOptions::default()
                    })
                    .build()
            })
            .expect("config");
        let version = EngineVersion::parse("1.2.3.4").expect("version");
        let event = EngineCreatedEvent::new(42, &config, version, EngineSource::Fallback);
        assert!(event.brotli_enabled);
        assert_eq!(event.http_cache_mode, 3);
        assert_eq!(event.thread_priority, UNSET_THREAD_PRIORITY);
        assert_eq!(event.initialization_ref, 5);
        assert_eq!(
            event.experimental_options.quic_migrate_sessions_on_network_change_v2,
            OptionValue::Enabled
        );
    }

    #[test]
    fn traffic_event_buckets_and_saturates() {
        let info = TrafficInfo {
            request_header_size: 100,
            response_body_size: 2_000_000,
            response_status_code: 200,
            negotiated_protocol: "h3".to_string(),
            headers_latency: Duration::from_millis(15),
            total_latency: Duration::from_secs(u64::MAX / 4),
            connection_migration_attempted: true,
            ..TrafficInfo::default()
        };
        let event = TrafficReportedEvent::new(7, &info, &DefaultSizeBucketer, 3);
        assert_eq!(event.request_header_size_bucket, 1);
        assert_eq!(event.request_body_size_bucket, 0);
        assert_eq!(event.response_body_size_bucket, 7);
        assert_eq!(event.negotiated_protocol_hash, protocol_hash("h3"));
        assert_eq!(event.headers_latency_ms, 15);
        assert_eq!(event.total_latency_ms, i32::MAX);
        assert_eq!(event.samples_rate_limited, 3);

        let wrapped = TelemetryEvent::TrafficReported(event);
        assert_eq!(wrapped.kind(), "traffic_reported");
        assert_eq!(wrapped.engine_id(), Some(7));
        assert_eq!(wrapped.initialization_ref(), None);
        let json = serde_json::to_value(&wrapped).expect("serialize");
        assert_eq!(json["type"], "traffic_reported");
    }

    #[test]
    fn builder_initialized_event_encodes_author_and_outcome() {
        let version = EngineVersion::parse("120.0.6099.4").expect("version");
        let info = EngineBuilderInitializedInfo {
            initialization_ref: 31,
            author: BuilderAuthor::Impl,
            builder_created_latency: Duration::from_micros(2_500),
            source: EngineSource::StaticallyLinked,
            creation_successful: Some(false),
            api_version: version,
            impl_version: version,
            uid: 10_123,
        };
        let event = TelemetryEvent::EngineBuilderInitialized((&info).into());
        assert_eq!(event.kind(), "engine_builder_initialized");
        assert_eq!(event.engine_id(), None);
        assert_eq!(event.initialization_ref(), Some(31));

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "engine_builder_initialized");
        assert_eq!(json["author"], 2);
        assert_eq!(json["builder_created_latency_ms"], 2);
        assert_eq!(json["creation_successful"], "disabled");
        assert_eq!(json["source"], "statically_linked");
    }

    #[test]
    fn engine_initialized_event_keeps_flag_lists() {
        let info = EngineInitializedInfo {
            initialization_ref: 8,
            engine_creation_latency: Duration::from_millis(40),
            engine_async_latency: Duration::from_secs(u64::MAX / 4),
            http_flags_names: vec![protocol_hash("flag_a"), protocol_hash("flag_b")],
            http_flags_values: vec![1, 0],
            ..EngineInitializedInfo::default()
        };
        let event = EngineInitializedEvent::from(&info);
        assert_eq!(event.engine_creation_latency_ms, 40);
        assert_eq!(event.engine_async_latency_ms, i32::MAX);
        assert_eq!(event.http_flags_successful, OptionValue::Unset);
        assert_eq!(event.http_flags_names.len(), 2);
        assert_eq!(event.http_flags_values, [1, 0]);
        assert_eq!(TelemetryEvent::EngineInitialized(event).kind(), "engine_initialized");
    }
}
