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

//! Network engine bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (configuration hand-off, engine ids, creation and traffic telemetry),
//! `error.rs` (caller-visible failures).

pub mod bootstrap;
pub mod error;

pub use bootstrap::{EngineBootstrap, EngineInstance, NetworkEngine, init_telemetry};
pub use error::{EngineCreateError, EngineError, EngineResult};
