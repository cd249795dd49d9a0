//! Translation of structured option objects into experimental-option document writes.
//!
//! # Design
//! - Each setter on the builder records one `OptionPatch`; `build()` applies them in the order
//!   they were recorded and later writes to the same key win.
//! - A patch validates its inputs before touching the document, so a rejected patch leaves
//!   no partial writes behind.

use std::time::Duration;

use tracing::debug;

use crate::document::{
    ASYNC_DNS_SECTION, ExperimentalOptionsDocument, QUIC_SECTION, STALE_DNS_SECTION,
};
use crate::error::{ConfigError, ConfigResult};
use crate::options::{ConnectionMigrationOptions, DnsOptions, QuicOptions};

/// A recorded document transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionPatch {
    /// Writes into the `QUIC` section.
    Quic(QuicOptions),
    /// Writes into the `AsyncDNS`, `StaleDNS` and `QUIC` sections.
    Dns(DnsOptions),
    /// Writes connection migration flags into the `QUIC` section.
    Migration(ConnectionMigrationOptions),
}

impl OptionPatch {
    /// Short label used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Quic(_) => "quic",
            Self::Dns(_) => "dns",
            Self::Migration(_) => "connection_migration",
        }
    }

    /// Apply the patch to `document`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfiguration` when the options describe a combination the
    /// engine cannot express.
    pub fn apply(&self, document: &mut ExperimentalOptionsDocument) -> ConfigResult<()> {
        debug!(patch = self.kind(), "applying experimental options patch");
        match self {
            Self::Quic(options) => {
                apply_quic(options, document);
                Ok(())
            }
            Self::Dns(options) => {
                apply_dns(options, document);
                Ok(())
            }
            Self::Migration(options) => apply_migration(*options, document),
        }
    }
}

/// Apply `patches` in order, stopping at the first failure.
///
/// # Errors
///
/// Propagates the first patch failure.
pub fn apply_all(
    patches: &[OptionPatch],
    document: &mut ExperimentalOptionsDocument,
) -> ConfigResult<()> {
    patches.iter().try_for_each(|patch| patch.apply(document))
}

fn apply_quic(options: &QuicOptions, document: &mut ExperimentalOptionsDocument) {
    let mut quic = document.section_mut(QUIC_SECTION);

    // Typed options always overwrite the JSON, even for list-like keys.
    if !options.allowed_quic_hosts.is_empty() {
        quic.put("host_whitelist", options.allowed_quic_hosts.join(","));
    }
    if let Some(user_agent) = &options.handshake_user_agent {
        quic.put("user_agent_id", user_agent.as_str());
    }
    if let Some(timeout) = options.idle_connection_timeout {
        quic.put("idle_connection_timeout_seconds", whole_seconds(timeout));
    }
}

fn apply_dns(options: &DnsOptions, document: &mut ExperimentalOptionsDocument) {
    {
        let mut async_dns = document.section_mut(ASYNC_DNS_SECTION);
        if let Some(enable) = options.use_http_stack_dns_resolver.as_bool() {
            async_dns.put("enable", enable);
        }
    }

    {
        let mut stale_dns = document.section_mut(STALE_DNS_SECTION);
        if let Some(enable) = options.enable_stale_dns.as_bool() {
            stale_dns.put("enable", enable);
        }
        if let Some(persist) = options.persist_host_cache.as_bool() {
            stale_dns.put("persist_to_disk", persist);
        }
        if let Some(period) = options.persist_host_cache_period {
            stale_dns.put("persist_delay_ms", whole_millis(period));
        }
        if let Some(stale) = &options.stale_dns_options {
            if let Some(allow) = stale.allow_cross_network_usage.as_bool() {
                stale_dns.put("allow_other_network", allow);
            }
            if let Some(timeout) = stale.fresh_lookup_timeout {
                stale_dns.put("delay_ms", whole_millis(timeout));
            }
            if let Some(use_stale) = stale.use_stale_on_name_not_resolved.as_bool() {
                stale_dns.put("use_stale_on_name_not_resolved", use_stale);
            }
            if let Some(delay) = stale.max_expired_delay {
                stale_dns.put("max_expired_time_ms", whole_millis(delay));
            }
        }
    }

    let mut quic = document.section_mut(QUIC_SECTION);
    if let Some(race) = options
        .preestablish_connections_to_stale_dns_results
        .as_bool()
    {
        quic.put("race_stale_dns_on_connection", race);
    }
}

const NON_DEFAULT_WITHOUT_PATH_DEGRADATION: &str =
    "cannot enable non-default network usage without path degradation migration";

/// Resolved migration writes, computed before the document is touched.
struct MigrationPlan {
    migrate_on_network_change: Option<bool>,
    migrate_early: Option<bool>,
    allow_port_migration: Option<bool>,
}

fn plan_migration(options: ConnectionMigrationOptions) -> ConfigResult<MigrationPlan> {
    let mut plan = MigrationPlan {
        migrate_on_network_change: options.default_network_migration.as_bool(),
        migrate_early: None,
        allow_port_migration: None,
    };

    let Some(path_degradation) = options.path_degradation_migration.as_bool() else {
        return Ok(plan);
    };

    match options.allow_non_default_network_usage.as_bool() {
        Some(true) if !path_degradation => {
            return Err(ConfigError::InvalidConfiguration {
                field: "allow_non_default_network_usage",
                message: NON_DEFAULT_WITHOUT_PATH_DEGRADATION,
            });
        }
        // Early migration to a non-default network supersedes port migration.
        Some(true) => plan.migrate_early = Some(true),
        Some(false) => {
            plan.migrate_early = Some(false);
            plan.allow_port_migration = Some(path_degradation);
        }
        None => plan.allow_port_migration = Some(path_degradation),
    }
    Ok(plan)
}

fn apply_migration(
    options: ConnectionMigrationOptions,
    document: &mut ExperimentalOptionsDocument,
) -> ConfigResult<()> {
    let plan = plan_migration(options)?;

    let mut quic = document.section_mut(QUIC_SECTION);
    if let Some(migrate) = plan.migrate_on_network_change {
        quic.put("migrate_sessions_on_network_change_v2", migrate);
    }
    if let Some(early) = plan.migrate_early {
        quic.put("migrate_sessions_early_v2", early);
    }
    if let Some(port) = plan.allow_port_migration {
        quic.put("allow_port_migration", port);
    }
    Ok(())
}

fn whole_seconds(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

fn whole_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
