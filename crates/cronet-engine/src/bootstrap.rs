//! Engine construction: freeze the configuration, start the engine, correlate it with an id
//! and report its creation.
//!
//! # Design
//! - The network engine itself is an external collaborator behind `NetworkEngine`.
//! - Only configuration conflicts and engine rejections reach the caller; telemetry is
//!   best effort and never fails construction.
//! - Every build attempt carries an initialization reference, so the builder, creation and
//!   initialization reports of one engine can be joined.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cronet_config::{EngineConfig, EngineConfigBuilder, EngineSettings, TelemetrySettings};
use cronet_telemetry::{
    BuilderAuthor, EngineBuilderInitializedInfo, EngineInitializedInfo, EngineSource,
    EngineVersion, LoggingConfig, Telemetry, TelemetryMetrics, TelemetryReporter, TrafficInfo,
    init_logging,
};
use tracing::{info, warn};

use crate::error::{EngineCreateError, EngineError, EngineResult};

/// External network stack that consumes a frozen configuration.
pub trait NetworkEngine: Send + Sync {
    /// Running engine returned by `create`.
    type Handle;

    /// Implementation version reported in telemetry.
    fn version(&self) -> EngineVersion;

    /// Where the implementation was loaded from.
    fn source(&self) -> EngineSource;

    /// Application uid reported with build attempts.
    fn uid(&self) -> i32 {
        0
    }

    /// Start an engine for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine cannot accept the configuration, for example because
    /// the experimental options text is not valid JSON.
    fn create(&self, config: &EngineConfig) -> Result<Self::Handle, EngineCreateError>;
}

/// Install the global tracing subscriber described by `settings`.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_telemetry(settings: &TelemetrySettings) -> EngineResult<()> {
    init_logging(&LoggingConfig::from(settings))
        .map_err(|err| EngineError::telemetry("init_logging", err))
}

/// Creates engines and wires them to telemetry.
#[derive(Debug)]
pub struct EngineBootstrap<E> {
    engine: E,
    telemetry: Arc<dyn Telemetry>,
}

impl<E: NetworkEngine> EngineBootstrap<E> {
    /// Bootstrap reporting through `telemetry`.
    #[must_use]
    pub fn new(engine: E, telemetry: Arc<dyn Telemetry>) -> Self {
        Self { engine, telemetry }
    }

    /// Bootstrap plus a pre-populated builder derived from a settings document.
    ///
    /// The reporter samples at the configured rate and records its counters in `metrics`.
    ///
    /// # Errors
    ///
    /// Returns configuration errors raised while applying the settings.
    pub fn from_settings(
        engine: E,
        settings: &EngineSettings,
        metrics: TelemetryMetrics,
    ) -> EngineResult<(Self, EngineConfigBuilder)> {
        let builder = settings
            .apply_to(EngineConfigBuilder::new())
            .map_err(|err| EngineError::config("settings.apply", err))?;
        let reporter = TelemetryReporter::from_settings(&settings.telemetry).metrics(metrics);
        Ok((Self::new(engine, Arc::new(reporter)), builder))
    }

    /// Telemetry shared with created engines.
    #[must_use]
    pub fn telemetry(&self) -> &Arc<dyn Telemetry> {
        &self.telemetry
    }

    /// Freeze `builder`, start an engine and report its creation.
    ///
    /// A builder without an initialization reference gets a fresh one. The build attempt is
    /// reported whether or not it succeeds.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` when the builder's options conflict and
    /// `EngineError::InvalidArgument` when the engine rejects the configuration.
    pub fn create(&self, builder: EngineConfigBuilder) -> EngineResult<EngineInstance<E::Handle>> {
        let initialization_ref = builder
            .pending_initialization_ref()
            .unwrap_or_else(|| self.telemetry.generate_id());
        let build_started = Instant::now();
        let built = builder
            .initialization_ref(initialization_ref)
            .build()
            .map_err(|err| EngineError::config("builder.build", err));
        let builder_latency = build_started.elapsed();

        let started = built.and_then(|config| {
            let create_started = Instant::now();
            let handle = self.engine.create(&config).map_err(|err| {
                warn!(error = %err, "network engine rejected its configuration");
                EngineError::invalid_argument("engine.create", err)
            })?;
            Ok((config, handle, create_started.elapsed()))
        });
        self.report_build_attempt(initialization_ref, builder_latency, started.is_ok());
        let (config, handle, creation_latency) = started?;

        let id = self.telemetry.generate_id();
        let version = self.engine.version();
        let source = self.engine.source();
        self.telemetry
            .log_engine_creation(id, Some(&config), Some(&version), Some(source));
        info!(engine_id = id, version = %version, ?source, "network engine created");

        Ok(EngineInstance {
            id,
            handle,
            config,
            creation_latency,
            telemetry: Arc::clone(&self.telemetry),
        })
    }

    fn report_build_attempt(&self, initialization_ref: i64, latency: Duration, succeeded: bool) {
        let version = self.engine.version();
        self.telemetry
            .log_engine_builder_initialized(&EngineBuilderInitializedInfo {
                initialization_ref,
                author: BuilderAuthor::Api,
                builder_created_latency: latency,
                source: self.engine.source(),
                creation_successful: Some(succeeded),
                api_version: version,
                impl_version: version,
                uid: self.engine.uid(),
            });
    }
}

/// A running engine together with its id and configuration.
#[derive(Debug)]
pub struct EngineInstance<H> {
    id: i64,
    handle: H,
    config: EngineConfig,
    creation_latency: Duration,
    telemetry: Arc<dyn Telemetry>,
}

impl<H> EngineInstance<H> {
    /// Correlation id used in telemetry.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// Engine handle.
    #[must_use]
    pub const fn handle(&self) -> &H {
        &self.handle
    }

    /// Configuration the engine was started with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Time the engine took to accept its configuration.
    #[must_use]
    pub const fn creation_latency(&self) -> Duration {
        self.creation_latency
    }

    /// Report that the engine finished its asynchronous start-up.
    ///
    /// The initialization reference and creation latency come from this instance.
    pub fn report_initialized(&self, info: EngineInitializedInfo) {
        self.telemetry.log_engine_initialized(&EngineInitializedInfo {
            initialization_ref: self.config.initialization_ref(),
            engine_creation_latency: self.creation_latency,
            ..info
        });
    }

    /// Report one finished request.
    pub fn report_traffic(&self, info: &TrafficInfo) {
        self.telemetry.log_traffic_reported(self.id, Some(info));
    }

    /// Release the engine handle.
    #[must_use]
    pub fn into_handle(self) -> H {
        self.handle
    }
}
