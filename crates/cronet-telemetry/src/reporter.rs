//! Engine lifecycle and traffic telemetry emission.
//!
//! # Design
//! - Nothing here returns an error: failures become a `debug!` line and a failure counter,
//!   so reporting can never break the engine it observes.
//! - Traffic samples pass the `RateLimiter` first. Rejected samples bump an atomic counter that
//!   the next accepted sample takes and resets in one `swap`.
//! - If delivering a sample fails, the count it carried is added back for a later sample.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use cronet_config::{EngineConfig, TelemetrySettings};
use tracing::debug;

use crate::buckets::{DefaultSizeBucketer, SizeBucketer};
use crate::events::{
    EngineBuilderInitializedInfo, EngineCreatedEvent, EngineInitializedInfo, EngineSource,
    EngineVersion, TelemetryEvent, TrafficInfo, TrafficReportedEvent,
};
use crate::id::IdGenerator;
use crate::metrics::TelemetryMetrics;
use crate::rate_limit::RateLimiter;
use crate::sink::{TelemetrySink, TracingSink};

/// Telemetry surface used by the engine wiring.
pub trait Telemetry: std::fmt::Debug + Send + Sync {
    /// New engine correlation id.
    fn generate_id(&self) -> i64;

    /// Report that an engine was created; a no-op when any input is missing.
    fn log_engine_creation(
        &self,
        engine_id: i64,
        config: Option<&EngineConfig>,
        version: Option<&EngineVersion>,
        source: Option<EngineSource>,
    );

    /// Report one request's traffic, subject to sampling; a no-op without `info`.
    fn log_traffic_reported(&self, engine_id: i64, info: Option<&TrafficInfo>);

    /// Report the outcome of an engine build attempt.
    fn log_engine_builder_initialized(&self, info: &EngineBuilderInitializedInfo);

    /// Report that an engine finished initializing.
    fn log_engine_initialized(&self, info: &EngineInitializedInfo);
}

/// Telemetry that generates ids but reports nothing.
#[derive(Debug, Default)]
pub struct NoopTelemetry {
    ids: IdGenerator,
}

impl Telemetry for NoopTelemetry {
    fn generate_id(&self) -> i64 {
        self.ids.generate()
    }

    fn log_engine_creation(
        &self,
        _engine_id: i64,
        _config: Option<&EngineConfig>,
        _version: Option<&EngineVersion>,
        _source: Option<EngineSource>,
    ) {
    }

    fn log_traffic_reported(&self, _engine_id: i64, _info: Option<&TrafficInfo>) {}

    fn log_engine_builder_initialized(&self, _info: &EngineBuilderInitializedInfo) {}

    fn log_engine_initialized(&self, _info: &EngineInitializedInfo) {}
}

/// Rate-limited reporter that forwards events to a `TelemetrySink`.
#[derive(Debug)]
pub struct TelemetryReporter {
    limiter: RateLimiter,
    samples_rate_limited: AtomicU32,
    ids: IdGenerator,
    sink: Arc<dyn TelemetrySink>,
    buckets: Arc<dyn SizeBucketer>,
    metrics: Option<TelemetryMetrics>,
}

impl TelemetryReporter {
    /// Reporter accepting `samples_per_second` traffic samples, logging through `tracing`.
    #[must_use]
    pub fn new(samples_per_second: u32) -> Self {
        Self::with_limiter(RateLimiter::new(samples_per_second))
    }

    /// Reporter configured from telemetry settings.
    #[must_use]
    pub fn from_settings(settings: &TelemetrySettings) -> Self {
        Self::new(settings.samples_per_second)
    }

    /// Reporter gated by an existing limiter.
    #[must_use]
    pub fn with_limiter(limiter: RateLimiter) -> Self {
        Self {
            limiter,
            samples_rate_limited: AtomicU32::new(0),
            ids: IdGenerator::default(),
            sink: Arc::new(TracingSink),
            buckets: Arc::new(DefaultSizeBucketer),
            metrics: None,
        }
    }

    /// Replace the event sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the size bucketer.
    #[must_use]
    pub fn bucketer(mut self, buckets: Arc<dyn SizeBucketer>) -> Self {
        self.buckets = buckets;
        self
    }

    /// Replace the id source.
    #[must_use]
    pub fn id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Record pipeline counters into `metrics`.
    #[must_use]
    pub fn metrics(mut self, metrics: TelemetryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Samples dropped since the last delivered traffic event.
    #[must_use]
    pub fn pending_rate_limited(&self) -> u32 {
        self.samples_rate_limited.load(Ordering::SeqCst)
    }

    fn write_traffic_reported(&self, engine_id: i64, info: &TrafficInfo, rate_limited: u32) {
        let event = TelemetryEvent::TrafficReported(TrafficReportedEvent::new(
            engine_id,
            info,
            self.buckets.as_ref(),
            rate_limited,
        ));
        if let Err(err) = self.sink.emit(&event) {
            // Another thread may have dropped samples meanwhile, so add rather than store.
            self.samples_rate_limited
                .fetch_add(rate_limited, Ordering::SeqCst);
            self.record_failure(&event, &err);
        } else {
            self.record_delivery(&event);
        }
    }

    fn emit(&self, event: &TelemetryEvent) {
        match self.sink.emit(event) {
            Ok(()) => self.record_delivery(event),
            Err(err) => self.record_failure(event, &err),
        }
    }

    fn record_delivery(&self, event: &TelemetryEvent) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_event(event.kind());
        }
    }

    fn record_failure(&self, event: &TelemetryEvent, err: &crate::error::TelemetryError) {
        debug!(
            engine_id = event.engine_id(),
            initialization_ref = event.initialization_ref(),
            kind = event.kind(),
            sink = self.sink.name(),
            error = %err,
            "failed to log telemetry event"
        );
        if let Some(metrics) = &self.metrics {
            metrics.inc_failure(event.kind());
        }
    }
}

impl Telemetry for TelemetryReporter {
    fn generate_id(&self) -> i64 {
        self.ids.generate()
    }

    fn log_engine_creation(
        &self,
        engine_id: i64,
        config: Option<&EngineConfig>,
        version: Option<&EngineVersion>,
        source: Option<EngineSource>,
    ) {
        let (Some(config), Some(version), Some(source)) = (config, version, source) else {
            return;
        };
        self.emit(&TelemetryEvent::EngineCreated(EngineCreatedEvent::new(
            engine_id, config, *version, source,
        )));
    }

    fn log_traffic_reported(&self, engine_id: i64, info: Option<&TrafficInfo>) {
        let Some(info) = info else {
            return;
        };
        if !self.limiter.try_acquire() {
            self.samples_rate_limited.fetch_add(1, Ordering::SeqCst);
            if let Some(metrics) = &self.metrics {
                metrics.inc_rate_limited();
            }
            return;
        }
        let rate_limited = self.samples_rate_limited.swap(0, Ordering::SeqCst);
        self.write_traffic_reported(engine_id, info, rate_limited);
    }

    fn log_engine_builder_initialized(&self, info: &EngineBuilderInitializedInfo) {
        self.emit(&TelemetryEvent::EngineBuilderInitialized(info.into()));
    }

    fn log_engine_initialized(&self, info: &EngineInitializedInfo) {
        self.emit(&TelemetryEvent::EngineInitialized(info.into()));
    }
}
