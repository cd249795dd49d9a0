//! Prometheus-backed counters describing the telemetry pipeline itself.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counts what the reporter does with samples; never the sample contents.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus registry shared by a reporter and whoever scrapes it.
#[derive(Clone)]
pub struct TelemetryMetrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    events_emitted_total: IntCounterVec,
    samples_rate_limited_total: IntCounter,
    failures_total: IntCounterVec,
}

impl std::fmt::Debug for TelemetryMetrics {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("TelemetryMetrics").finish_non_exhaustive()
    }
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Engine-created events delivered.
    pub engine_created_total: u64,
    /// Traffic events delivered.
    pub traffic_reported_total: u64,
    /// Builder-initialized events delivered.
    pub engine_builder_initialized_total: u64,
    /// Engine-initialized events delivered.
    pub engine_initialized_total: u64,
    /// Traffic samples dropped by the limiter.
    pub samples_rate_limited_total: u64,
    /// Emission failures across all event kinds.
    pub failures_total: u64,
}

const EVENT_KINDS: [&str; 4] = [
    "engine_created",
    "traffic_reported",
    "engine_builder_initialized",
    "engine_initialized",
];

impl TelemetryMetrics {
    /// Construct a registry with the telemetry collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let events_emitted_total = IntCounterVec::new(
            Opts::new(
                "cronet_telemetry_events_emitted_total",
                "Telemetry events delivered to the sink by kind",
            ),
            &["kind"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "cronet_telemetry_events_emitted_total",
            source,
        })?;
        let samples_rate_limited_total = IntCounter::with_opts(Opts::new(
            "cronet_telemetry_samples_rate_limited_total",
            "Traffic samples dropped by the sampling limiter",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "cronet_telemetry_samples_rate_limited_total",
            source,
        })?;
        let failures_total = IntCounterVec::new(
            Opts::new(
                "cronet_telemetry_failures_total",
                "Telemetry events that could not be delivered by kind",
            ),
            &["kind"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "cronet_telemetry_failures_total",
            source,
        })?;

        registry
            .register(Box::new(events_emitted_total.clone()))
            .map_err(|source| TelemetryError::MetricsRegister {
                name: "cronet_telemetry_events_emitted_total",
                source,
            })?;
        registry
            .register(Box::new(samples_rate_limited_total.clone()))
            .map_err(|source| TelemetryError::MetricsRegister {
                name: "cronet_telemetry_samples_rate_limited_total",
                source,
            })?;
        registry
            .register(Box::new(failures_total.clone()))
            .map_err(|source| TelemetryError::MetricsRegister {
                name: "cronet_telemetry_failures_total",
                source,
            })?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                events_emitted_total,
                samples_rate_limited_total,
                failures_total,
            }),
        })
    }

    /// Count a delivered event of `kind`.
    pub fn inc_event(&self, kind: &str) {
        self.inner
            .events_emitted_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Count a sample dropped by the limiter.
    pub fn inc_rate_limited(&self) {
        self.inner.samples_rate_limited_total.inc();
    }

    /// Count an event of `kind` that failed to reach the sink.
    pub fn inc_failure(&self, kind: &str) {
        self.inner.failures_total.with_label_values(&[kind]).inc();
    }

    /// Render the registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let events = |kind: &str| {
            self.inner
                .events_emitted_total
                .with_label_values(&[kind])
                .get()
        };
        MetricsSnapshot {
            engine_created_total: events(EVENT_KINDS[0]),
            traffic_reported_total: events(EVENT_KINDS[1]),
            engine_builder_initialized_total: events(EVENT_KINDS[2]),
            engine_initialized_total: events(EVENT_KINDS[3]),
            samples_rate_limited_total: self.inner.samples_rate_limited_total.get(),
            failures_total: EVENT_KINDS
                .iter()
                .map(|kind| self.inner.failures_total.with_label_values(&[*kind]).get())
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_snapshot_reflects_updates() -> Result<()> {
        let metrics = TelemetryMetrics::new()?;
        metrics.inc_event("engine_created");
        metrics.inc_event("traffic_reported");
        metrics.inc_event("traffic_reported");
        metrics.inc_event("engine_initialized");
        metrics.inc_rate_limited();
        metrics.inc_failure("traffic_reported");

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                engine_created_total: 1,
                traffic_reported_total: 2,
                engine_builder_initialized_total: 0,
                engine_initialized_total: 1,
                samples_rate_limited_total: 1,
                failures_total: 1,
            }
        );

        let rendered = metrics.render()?;
        assert!(rendered.contains("cronet_telemetry_events_emitted_total"));
        assert!(rendered.contains("cronet_telemetry_samples_rate_limited_total"));
        assert!(rendered.contains("cronet_telemetry_failures_total"));
        Ok(())
    }

    #[test]
    fn clones_share_the_registry() -> Result<()> {
        let metrics = TelemetryMetrics::new()?;
        let clone = metrics.clone();
        clone.inc_rate_limited();
        assert_eq!(metrics.snapshot().samples_rate_limited_total, 1);
        Ok(())
    }
}
