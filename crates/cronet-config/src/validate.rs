//! Validation helpers for scalar builder settings.

use std::collections::BTreeMap;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use url::Host;

use crate::error::{ConfigError, ConfigResult};

const SECTION: &str = "builder";
const MAX_PIN_HOST_LEN: usize = 255;
/// Length of a SHA-256 public key pin.
pub const PIN_SHA256_LEN: usize = 32;
/// Highest (least favourable) thread priority accepted by the network thread.
pub const THREAD_PRIORITY_LOWEST: i32 = 19;
/// Lowest (most favourable) thread priority accepted by the network thread.
pub const THREAD_PRIORITY_HIGHEST: i32 = -20;

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn ensure_storage_directory(path: &Path) -> ConfigResult<()> {
    let metadata = std::fs::metadata(path).map_err(|source| ConfigError::Io {
        operation: "storage_path.metadata",
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::invalid_field(
            SECTION,
            "storage_path",
            Some(path.display().to_string()),
            "storage path must be set to an existing directory",
        ))
    }
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn ensure_quic_hint_host(host: &str) -> ConfigResult<()> {
    if host.contains('/') {
        return Err(ConfigError::invalid_field(
            SECTION,
            "quic_hint.host",
            Some(host.to_string()),
            "illegal QUIC hint host",
        ));
    }
    Ok(())
}

/// Validate a pinning host name and convert it to its ASCII-compatible form.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn pin_host_to_ascii(host: &str) -> ConfigResult<String> {
    let invalid = |message: &str| {
        ConfigError::invalid_field(
            SECTION,
            "public_key_pin.host",
            Some(host.to_string()),
            message,
        )
    };

    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid(
            "a hostname should not consist of digits and/or dots only",
        ));
    }
    if host.len() > MAX_PIN_HOST_LEN {
        return Err(invalid("hostname is too long"));
    }

    match Host::parse(host) {
        Ok(Host::Domain(ascii)) => Ok(ascii),
        Ok(_) | Err(_) => Err(invalid(
            "hostname does not comply with RFC 1122 and RFC 1123",
        )),
    }
}

/// Check every pin is a SHA-256 digest and drop duplicates, keyed by their base64 form.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn dedup_pins<I>(pins: I) -> ConfigResult<Vec<[u8; PIN_SHA256_LEN]>>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut unique = BTreeMap::new();
    for pin in pins {
        let bytes: [u8; PIN_SHA256_LEN] = pin.as_ref().try_into().map_err(|_| {
            ConfigError::invalid_field(
                SECTION,
                "public_key_pin.sha256",
                Some(pin.as_ref().len().to_string()),
                "public key pin is invalid",
            )
        })?;
        unique.insert(general_purpose::STANDARD.encode(bytes), bytes);
    }
    Ok(unique.into_values().collect())
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn ensure_thread_priority(priority: i32) -> ConfigResult<()> {
    if (THREAD_PRIORITY_HIGHEST..=THREAD_PRIORITY_LOWEST).contains(&priority) {
        Ok(())
    } else {
        Err(ConfigError::invalid_field(
            SECTION,
            "thread_priority",
            Some(priority.to_string()),
            format!(
                "must be between {THREAD_PRIORITY_HIGHEST} and {THREAD_PRIORITY_LOWEST}"
            ),
        ))
    }
}
