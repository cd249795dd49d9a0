//! Destinations for telemetry events.
//!
//! # Design
//! - Sinks return errors instead of logging them; the reporter decides what a failure costs.
//! - `TracingSink` forwards events into the structured log stream; `MemorySink` keeps them
//!   for assertions and can be told to fail.

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::error::{Result, TelemetryError};
use crate::events::TelemetryEvent;

/// Receives formatted telemetry events.
pub trait TelemetrySink: Debug + Send + Sync {
    /// Identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Returns an error when the event could not be encoded or delivered.
    fn emit(&self, event: &TelemetryEvent) -> Result<()>;
}

/// Writes each event as a JSON payload on the `cronet::telemetry` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn emit(&self, event: &TelemetryEvent) -> Result<()> {
        let payload = serde_json::to_string(event).map_err(|source| {
            TelemetryError::EncodeEvent {
                event: event.kind(),
                source,
            }
        })?;
        info!(
            target: "cronet::telemetry",
            kind = event.kind(),
            engine_id = event.engine_id(),
            %payload,
            "telemetry event"
        );
        Ok(())
    }
}

/// In-memory sink for tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TelemetryEvent>>,
    failures_pending: AtomicUsize,
}

impl MemorySink {
    /// Empty sink that accepts every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` events.
    pub fn fail_next(&self, count: usize) {
        self.failures_pending.store(count, Ordering::SeqCst);
    }

    /// Events accepted so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TelemetrySink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn emit(&self, event: &TelemetryEvent) -> Result<()> {
        let failing = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |pending| {
                pending.checked_sub(1)
            })
            .is_ok();
        if failing {
            return Err(TelemetryError::Sink {
                sink: self.name(),
                message: "injected failure".to_string(),
            });
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}
