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

//! Telemetry for network engines: logging setup, sampling, event formatting and delivery.
//!
//! Layout: `init.rs` (tracing subscriber), `clock.rs` + `rate_limit.rs` (sampling gate),
//! `id.rs` (engine ids), `buckets.rs` + `hash.rs` (sample anonymisation), `events.rs`
//! (payloads), `sink.rs` (destinations), `metrics.rs` (Prometheus counters), `reporter.rs`
//! (`TelemetryReporter`).

pub mod buckets;
pub mod clock;
pub mod error;
pub mod events;
pub mod hash;
pub mod id;
pub mod init;
pub mod metrics;
pub mod rate_limit;
pub mod reporter;
pub mod sink;

pub use buckets::{DefaultSizeBucketer, SizeBucketer};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, TelemetryError};
pub use events::{
    BuilderAuthor, EngineBuilderInitializedEvent, EngineBuilderInitializedInfo,
    EngineCreatedEvent, EngineInitializedEvent, EngineInitializedInfo, EngineSource,
    EngineVersion, ExperimentalOptionsSnapshot, TelemetryEvent, TrafficInfo,
    TrafficReportedEvent, UNSET_INT_VALUE, UNSET_THREAD_PRIORITY,
};
pub use hash::protocol_hash;
pub use id::IdGenerator;
pub use init::{LogFormat, LoggingConfig, init_logging, log_format_from_config};
pub use metrics::{MetricsSnapshot, TelemetryMetrics};
pub use rate_limit::RateLimiter;
pub use reporter::{NoopTelemetry, Telemetry, TelemetryReporter};
pub use sink::{MemorySink, TelemetrySink, TracingSink};
