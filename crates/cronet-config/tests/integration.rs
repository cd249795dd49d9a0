use std::time::Duration;

use cronet_config::{
    ConfigError, ConnectionMigrationOptions, DnsOptions, EngineConfigBuilder, EngineSettings,
    ExperimentalOptionsDocument, HttpCacheMode, OptionValue, QUIC_SECTION, QuicOptions,
    STALE_DNS_SECTION, StaleDnsOptions,
};
use serde_json::json;

fn migration(
    default_network: OptionValue,
    path_degradation: OptionValue,
    non_default: OptionValue,
) -> ConnectionMigrationOptions {
    ConnectionMigrationOptions {
        default_network_migration: default_network,
        path_degradation_migration: path_degradation,
        allow_non_default_network_usage: non_default,
    }
}

#[test]
fn patched_document_survives_serialize_and_reparse() -> anyhow::Result<()> {
    let config = EngineConfigBuilder::new()
        .experimental_options(r#"{"QUIC":{"max_server_configs_stored_in_properties":7}}"#)
        .quic_options(QuicOptions {
            allowed_quic_hosts: vec!["a.example".into(), "b.example".into()],
            handshake_user_agent: Some("agent/1.0".into()),
            idle_connection_timeout: Some(Duration::from_secs(45)),
        })
        .dns_options(DnsOptions {
            enable_stale_dns: OptionValue::Enabled,
            persist_host_cache_period: Some(Duration::from_millis(2500)),
            stale_dns_options: Some(StaleDnsOptions {
                max_expired_delay: Some(Duration::from_secs(3)),
                ..StaleDnsOptions::default()
            }),
            ..DnsOptions::default()
        })
        .build()?;

    let reparsed = ExperimentalOptionsDocument::parse(config.experimental_options_text());
    assert_eq!(&reparsed, config.experimental_options());

    assert_eq!(
        reparsed.get_or_default(QUIC_SECTION, "host_whitelist", String::new()),
        "a.example,b.example"
    );
    assert_eq!(
        reparsed.get_or_default(QUIC_SECTION, "user_agent_id", String::new()),
        "agent/1.0"
    );
    assert_eq!(
        reparsed.get_or_default(QUIC_SECTION, "idle_connection_timeout_seconds", -1_i64),
        45
    );
    assert_eq!(
        reparsed.get_or_default(QUIC_SECTION, "max_server_configs_stored_in_properties", -1_i32),
        7
    );
    assert!(reparsed.get_or_default(STALE_DNS_SECTION, "enable", false));
    assert_eq!(
        reparsed.get_or_default(STALE_DNS_SECTION, "persist_delay_ms", -1_i64),
        2500
    );
    assert_eq!(
        reparsed.get_or_default(STALE_DNS_SECTION, "max_expired_time_ms", -1_i64),
        3000
    );

    assert!(reparsed.get_or_default(STALE_DNS_SECTION, "persist_to_disk", true));
    assert_eq!(
        reparsed.get_or_default(QUIC_SECTION, "migrate_sessions_early_v2", -1_i32),
        -1
    );
    Ok(())
}

#[test]
fn migration_conflict_fails_build() {
    let result = EngineConfigBuilder::new()
        .connection_migration_options(migration(
            OptionValue::Unset,
            OptionValue::Disabled,
            OptionValue::Enabled,
        ))
        .build();
    assert!(matches!(
        result,
        Err(ConfigError::InvalidConfiguration {
            field: "allow_non_default_network_usage",
            ..
        })
    ));
}

#[test]
fn path_degradation_with_non_default_network_migrates_early() -> anyhow::Result<()> {
    let config = EngineConfigBuilder::new()
        .connection_migration_options(migration(
            OptionValue::Unset,
            OptionValue::Enabled,
            OptionValue::Enabled,
        ))
        .build()?;
    let doc = config.experimental_options();
    assert_eq!(doc.get::<bool>(QUIC_SECTION, "migrate_sessions_early_v2"), Some(true));
    assert!(!doc.contains(QUIC_SECTION, "allow_port_migration"));
    Ok(())
}

#[test]
fn path_degradation_alone_allows_port_migration() -> anyhow::Result<()> {
    let config = EngineConfigBuilder::new()
        .connection_migration_options(migration(
            OptionValue::Unset,
            OptionValue::Enabled,
            OptionValue::Unset,
        ))
        .build()?;
    let doc = config.experimental_options();
    assert_eq!(doc.get::<bool>(QUIC_SECTION, "allow_port_migration"), Some(true));
    assert!(!doc.contains(QUIC_SECTION, "migrate_sessions_early_v2"));
    Ok(())
}

#[test]
fn malformed_options_behave_like_empty_text() {
    let malformed = ExperimentalOptionsDocument::parse("{not json");
    assert_eq!(malformed, ExperimentalOptionsDocument::parse(""));
    assert!(malformed.is_empty());
    assert_eq!(malformed.get_or_default(QUIC_SECTION, "anything", 42_i64), 42);
    assert!(!malformed.get_or_default(STALE_DNS_SECTION, "enable", false));
    assert!(malformed.top_level_or_default("disable_ipv6_on_wifi", true));
}

#[test]
fn settings_file_configures_the_builder() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let settings_path = dir.path().join("engine.json");
    let settings = json!({
        "user_agent": "integration/1.0",
        "storage_path": dir.path(),
        "enable_brotli": true,
        "http_cache": {"mode": "disk", "max_size": 4096},
        "quic_hints": [{"host": "quic.example", "port": 443, "alternate_port": 443}],
        "thread_priority": 5,
        "connection_migration": {"default_network_migration": true},
        "telemetry": {"samples_per_second": 3}
    });
    std::fs::write(&settings_path, serde_json::to_vec(&settings)?)?;

    let loaded = EngineSettings::load(&settings_path)?;
    assert_eq!(loaded.telemetry.samples_per_second, 3);
    let config = loaded.apply_to(EngineConfigBuilder::new())?.build()?;

    assert_eq!(config.user_agent(), Some("integration/1.0"));
    assert!(config.brotli_enabled());
    assert_eq!(config.http_cache_mode(), HttpCacheMode::Disk);
    assert_eq!(config.quic_hints().len(), 1);
    assert_eq!(config.thread_priority_or(0), 5);
    assert_eq!(
        config
            .experimental_options()
            .get::<bool>(QUIC_SECTION, "migrate_sessions_on_network_change_v2"),
        Some(true)
    );
    Ok(())
}

#[test]
fn later_patches_overwrite_earlier_keys() -> anyhow::Result<()> {
    let config = EngineConfigBuilder::new()
        .connection_migration_options(migration(
            OptionValue::Enabled,
            OptionValue::Unset,
            OptionValue::Unset,
        ))
        .connection_migration_options(migration(
            OptionValue::Disabled,
            OptionValue::Unset,
            OptionValue::Unset,
        ))
        .build()?;
    assert_eq!(
        config
            .experimental_options()
            .get::<bool>(QUIC_SECTION, "migrate_sessions_on_network_change_v2"),
        Some(false)
    );
    Ok(())
}
