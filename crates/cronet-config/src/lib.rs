#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Engine configuration: the experimental options document, typed option patches and the
//! builder that turns both into an immutable `EngineConfig`.
//!
//! Layout: `option_value.rs` (tri-state toggles), `connection_options.rs` (QUIC tag
//! allow-list), `document.rs` (experimental options JSON), `options.rs` + `patch.rs`
//! (structured options and their key mapping), `validate.rs` (setter checks), `builder.rs`
//! (`EngineConfigBuilder`/`EngineConfig`), `settings.rs` (JSON settings files).

pub mod builder;
pub mod connection_options;
pub mod document;
pub mod error;
pub mod option_value;
pub mod options;
pub mod patch;
pub mod settings;
pub mod validate;

pub use builder::{
    EngineConfig, EngineConfigBuilder, HttpCacheMode, HttpCacheType, PublicKeyPin, QuicHint,
};
pub use connection_options::{filter_connection_options, is_known_connection_option};
pub use document::{
    ASYNC_DNS_SECTION, ExperimentalOptionsDocument, OptionType, QUIC_SECTION, STALE_DNS_SECTION,
    Section,
};
pub use error::{ConfigError, ConfigResult};
pub use option_value::OptionValue;
pub use options::{ConnectionMigrationOptions, DnsOptions, QuicOptions, StaleDnsOptions};
pub use patch::{OptionPatch, apply_all};
pub use settings::{
    DnsSettings, EngineSettings, HttpCacheSettings, MigrationSettings, PublicKeyPinSettings,
    QuicHintSettings, QuicSettings, StaleDnsSettings, TelemetrySettings,
};
