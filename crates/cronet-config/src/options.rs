//! Structured option objects accepted by the engine builder.
//!
//! # Design
//! - Plain data carriers; translation into experimental-option keys lives in `patch.rs`.
//! - Tri-state toggles use `OptionValue` so "not specified" never overrides engine defaults.

use std::time::Duration;

use crate::option_value::OptionValue;

/// QUIC tunables exposed as a typed surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuicOptions {
    /// Hosts allowed to use QUIC; empty means no restriction is written.
    pub allowed_quic_hosts: Vec<String>,
    /// User agent announced during the QUIC handshake.
    pub handshake_user_agent: Option<String>,
    /// Idle timeout after which QUIC connections are closed.
    pub idle_connection_timeout: Option<Duration>,
}

/// Host resolution behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsOptions {
    /// Use the network stack's own asynchronous resolver.
    pub use_http_stack_dns_resolver: OptionValue,
    /// Persist the host cache to disk.
    pub persist_host_cache: OptionValue,
    /// Serve stale entries from the host cache.
    pub enable_stale_dns: OptionValue,
    /// Minimum delay between host cache persistence writes.
    pub persist_host_cache_period: Option<Duration>,
    /// Race connections to stale results against fresh lookups.
    pub preestablish_connections_to_stale_dns_results: OptionValue,
    /// Fine-grained stale DNS policy.
    pub stale_dns_options: Option<StaleDnsOptions>,
}

/// Stale host-cache policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaleDnsOptions {
    /// How long to wait for a fresh lookup before serving a stale result.
    pub fresh_lookup_timeout: Option<Duration>,
    /// How long past expiry a cached result may still be served.
    pub max_expired_delay: Option<Duration>,
    /// Allow results cached on another network.
    pub allow_cross_network_usage: OptionValue,
    /// Serve stale results when the fresh lookup reports `NAME_NOT_RESOLVED`.
    pub use_stale_on_name_not_resolved: OptionValue,
}

/// QUIC connection migration policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionMigrationOptions {
    /// Migrate sessions when the default network changes.
    pub default_network_migration: OptionValue,
    /// Migrate sessions when the current path degrades.
    pub path_degradation_migration: OptionValue,
    /// Allow migrating to a network other than the default one.
    pub allow_non_default_network_usage: OptionValue,
}

