//! Experimental options document: the JSON blob of field-trial sections handed to the engine.
//!
//! # Design
//! - Entries stay as `serde_json::Value` so keys this crate does not know about survive a
//!   parse/serialize round trip untouched.
//! - Reads are best effort: a missing section, missing key or wrongly typed value yields the
//!   caller's default instead of an error.
//! - Malformed input degrades to an empty document; it never fails engine construction.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Field trial holding QUIC tunables.
pub const QUIC_SECTION: &str = "QUIC";
/// Field trial toggling the built-in asynchronous resolver.
pub const ASYNC_DNS_SECTION: &str = "AsyncDNS";
/// Field trial configuring stale host-cache usage.
pub const STALE_DNS_SECTION: &str = "StaleDNS";

/// Scalar types that can be read out of the document.
pub trait OptionType: Sized {
    /// Extract `Self` from a stored value, or `None` on a type mismatch.
    fn from_value(value: &Value) -> Option<Self>;
}

impl OptionType for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl OptionType for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl OptionType for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|raw| Self::try_from(raw).ok())
    }
}

impl OptionType for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

/// Mutable document of `section -> option -> value` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExperimentalOptionsDocument {
    root: Map<String, Value>,
}

impl ExperimentalOptionsDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` as a JSON object, falling back to an empty document on any failure.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::new();
        }
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(root)) => Self { root },
            Ok(other) => {
                debug!(
                    kind = value_kind(&other),
                    "experimental options are not a JSON object; using default values"
                );
                Self::new()
            }
            Err(err) => {
                debug!(
                    error = %err,
                    "experimental options could not be parsed; using default values"
                );
                Self::new()
            }
        }
    }

    /// Whether the document has no sections or top-level keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Typed lookup of `section.key`, or `None` when absent or of another type.
    #[must_use]
    pub fn get<T: OptionType>(&self, section: &str, key: &str) -> Option<T> {
        let Some(entries) = self.section(section) else {
            debug!(section, "experimental options section is absent");
            return None;
        };
        let value = entries.get(key)?;
        let typed = T::from_value(value);
        if typed.is_none() {
            debug!(
                section,
                key,
                kind = value_kind(value),
                "experimental option has an unexpected type"
            );
        }
        typed
    }

    /// Typed lookup of `section.key`, substituting `default` when absent or mistyped.
    #[must_use]
    pub fn get_or_default<T: OptionType>(&self, section: &str, key: &str, default: T) -> T {
        self.get(section, key).unwrap_or(default)
    }

    /// Typed lookup of an option stored outside any section.
    #[must_use]
    pub fn top_level<T: OptionType>(&self, key: &str) -> Option<T> {
        self.root.get(key).and_then(T::from_value)
    }

    /// Typed lookup of a top-level option, substituting `default` when absent or mistyped.
    #[must_use]
    pub fn top_level_or_default<T: OptionType>(&self, key: &str, default: T) -> T {
        self.top_level(key).unwrap_or(default)
    }

    /// Whether `section.key` is present, regardless of its type.
    #[must_use]
    pub fn contains(&self, section: &str, key: &str) -> bool {
        self.section(section)
            .is_some_and(|entries| entries.contains_key(key))
    }

    /// Read-only view of a section, if present and an object.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.root.get(name).and_then(Value::as_object)
    }

    /// Return the named section, inserting an empty one first when it is missing.
    ///
    /// A non-object value stored under `name` is replaced.
    pub fn section_mut(&mut self, name: &str) -> Section<'_> {
        let slot = self
            .root
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            debug!(
                section = name,
                kind = value_kind(slot),
                "replacing non-object experimental options section"
            );
            *slot = Value::Object(Map::new());
        }
        Section { slot }
    }

    /// Canonical JSON text handed to the engine.
    #[must_use]
    pub fn to_serialized_form(&self) -> String {
        self.to_string()
    }
}

impl Display for ExperimentalOptionsDocument {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.root).map_err(|_| fmt::Error)?;
        formatter.write_str(&text)
    }
}

/// Mutable handle to one field-trial section.
#[derive(Debug)]
pub struct Section<'a> {
    slot: &'a mut Value,
}

impl Section<'_> {
    /// Store `value` under `key`, replacing any previous entry.
    pub fn put(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        if let Some(entries) = self.slot.as_object_mut() {
            entries.insert(key.to_string(), value.into());
        }
        self
    }

    /// Number of entries in the section.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slot.as_object().map_or(0, Map::len)
    }

    /// Whether the section has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_text_degrades_to_empty_document() {
        let broken = ExperimentalOptionsDocument::parse("{not json");
        assert_eq!(broken, ExperimentalOptionsDocument::parse(""));
        assert!(broken.is_empty());
        assert_eq!(broken.get_or_default(QUIC_SECTION, "user_agent_id", 7_i32), 7);
        assert!(broken.get_or_default(STALE_DNS_SECTION, "enable", true));
    }

    #[test]
    fn non_object_top_level_is_ignored() {
        assert!(ExperimentalOptionsDocument::parse("[1, 2]").is_empty());
        assert!(ExperimentalOptionsDocument::parse("42").is_empty());
    }

    #[test]
    fn type_mismatch_returns_default() {
        let doc = ExperimentalOptionsDocument::parse(
            &json!({"QUIC": {"idle_connection_timeout_seconds": "30", "enable": 1}}).to_string(),
        );
        assert_eq!(
            doc.get_or_default(QUIC_SECTION, "idle_connection_timeout_seconds", -1_i32),
            -1
        );
        assert!(!doc.get_or_default(QUIC_SECTION, "enable", false));
        assert_eq!(doc.get::<String>(QUIC_SECTION, "enable"), None);
    }

    #[test]
    fn integers_outside_i32_fall_back_for_i32_lookups() {
        let doc = ExperimentalOptionsDocument::parse(r#"{"StaleDNS":{"delay_ms":5000000000}}"#);
        assert_eq!(doc.get_or_default(STALE_DNS_SECTION, "delay_ms", -1_i32), -1);
        assert_eq!(
            doc.get_or_default(STALE_DNS_SECTION, "delay_ms", -1_i64),
            5_000_000_000
        );
    }

    #[test]
    fn section_creation_is_idempotent() {
        let mut doc = ExperimentalOptionsDocument::new();
        doc.section_mut(QUIC_SECTION).put("a", true);
        doc.section_mut(QUIC_SECTION).put("b", 3);
        let section = doc.section(QUIC_SECTION).expect("section exists");
        assert_eq!(section.len(), 2);
        assert_eq!(doc.to_serialized_form(), r#"{"QUIC":{"a":true,"b":3}}"#);
    }

    #[test]
    fn non_object_section_is_replaced() {
        let mut doc = ExperimentalOptionsDocument::parse(r#"{"QUIC": "oops"}"#);
        assert!(doc.section(QUIC_SECTION).is_none());
        assert!(doc.section_mut(QUIC_SECTION).is_empty());
        assert!(doc.section(QUIC_SECTION).is_some());
    }

    #[test]
    fn unknown_entries_survive_round_trip() {
        let input = json!({
            "HostResolverRules": {"host_resolver_rules": "MAP * 127.0.0.1"},
            "QUIC": {"nested": {"list": [1, 2, 3]}},
            "disable_ipv6_on_wifi": true
        });
        let doc = ExperimentalOptionsDocument::parse(&input.to_string());
        let reparsed: Value =
            serde_json::from_str(&doc.to_serialized_form()).expect("serialized form is json");
        assert_eq!(reparsed, input);
        assert!(doc.top_level_or_default("disable_ipv6_on_wifi", false));
        assert!(doc.contains(QUIC_SECTION, "nested"));
    }
}
