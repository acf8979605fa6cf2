//! # Core Configuration
//!
//! Builder-based configuration for [`CoreService`](crate::CoreService).
//!
//! ## Overview
//!
//! `CoreConfig` holds every host capability and setting the playback core
//! needs. [`CoreConfigBuilder::build`] fails fast when a required bridge is
//! missing, so a misconfigured host finds out at startup rather than on the
//! first `play_queue`.
//!
//! ## Required Dependencies
//!
//! - `AudioBackendFactory` - Creates the platform decode/output resource for
//!   every loaded track
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - Range requests for streamed media (desktop default: reqwest)
//! - `MediaSessionSink`, `WidgetSink`, `ForegroundLifecycleSink` - default to no-ops
//! - `CacheProvider` - defaults to one process-wide `NetworkCache`
//!
//! ## Usage
//!
//! ```ignore
//! use core_service::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .audio_backends(Arc::new(MyBackends))
//!     .widget_sink(Arc::new(MyWidget))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_service::CoreConfig;
//!
//! // No AudioBackendFactory: fails with an actionable message
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{CoreError, Result};
use bridge_traits::{AudioBackendFactory, HttpClient};
use core_playback::{
    CacheProvider, ForegroundLifecycleSink, MediaSessionSink, PlaybackConfig, Sinks, WidgetSink,
};
use core_runtime::logging::LoggingConfig;
use std::sync::Arc;

/// Default capacity of the core event bus.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

/// Core configuration for the playback service.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Platform audio backends (required)
    pub audio_backends: Arc<dyn AudioBackendFactory>,

    /// HTTP client for streamed media (optional with desktop default)
    pub http_client: Arc<dyn HttpClient>,

    /// Session, widget and foreground lifecycle sinks
    pub sinks: Sinks,

    /// Supplies the network cache to streaming engines. `None` uses a single
    /// shared cache sized from `playback.cache`.
    pub cache_provider: Option<Arc<dyn CacheProvider>>,

    pub playback: PlaybackConfig,

    /// Capacity of the broadcast channel behind the event bus
    pub event_bus_capacity: usize,

    /// Install the global tracing subscriber on start
    pub logging: Option<LoggingConfig>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("audio_backends", &"AudioBackendFactory { ... }")
            .field("http_client", &"HttpClient { ... }")
            .field("sinks", &self.sinks)
            .field(
                "cache_provider",
                &self.cache_provider.as_ref().map(|_| "CacheProvider { ... }"),
            )
            .field("playback", &self.playback)
            .field("event_bus_capacity", &self.event_bus_capacity)
            .field("logging", &self.logging.as_ref().map(|l| l.format))
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - Event bus capacity is > 0
    /// - Playback, streaming and cache settings are consistent
    pub fn validate(&self) -> Result<()> {
        if self.event_bus_capacity == 0 {
            return Err(CoreError::Config(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        self.playback
            .validate()
            .map_err(|e| CoreError::Config(format!("playback: {}", e)))?;

        Ok(())
    }
}

fn audio_backends_missing_error() -> CoreError {
    CoreError::CapabilityMissing {
        capability: "AudioBackendFactory".to_string(),
        message: "An AudioBackendFactory is required to decode and output audio. \
                 Desktop: wrap the host audio stack (e.g. rodio, AVFoundation) in an AudioBackend. \
                 Mobile: inject the platform media player."
            .to_string(),
    }
}

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| {
        CoreError::InitializationFailed(format!("Failed to create default HttpClient: {}", e))
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(all(feature = "desktop-shims", not(target_arch = "wasm32"))))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(CoreError::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for streamed tracks. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Mobile: inject a URLSession/OkHttp-backed client."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    audio_backends: Option<Arc<dyn AudioBackendFactory>>,
    http_client: Option<Arc<dyn HttpClient>>,
    sinks: Sinks,
    cache_provider: Option<Arc<dyn CacheProvider>>,
    playback: Option<PlaybackConfig>,
    event_bus_capacity: Option<usize>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Sets the platform audio backend factory.
    pub fn audio_backends(mut self, backends: Arc<dyn AudioBackendFactory>) -> Self {
        self.audio_backends = Some(backends);
        self
    }

    /// Sets the HTTP client used for streamed tracks.
    ///
    /// Overrides the desktop default when `desktop-shims` is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn session_sink(mut self, sink: Arc<dyn MediaSessionSink>) -> Self {
        self.sinks = self.sinks.with_session(sink);
        self
    }

    pub fn widget_sink(mut self, sink: Arc<dyn WidgetSink>) -> Self {
        self.sinks = self.sinks.with_widget(sink);
        self
    }

    pub fn lifecycle_sink(mut self, sink: Arc<dyn ForegroundLifecycleSink>) -> Self {
        self.sinks = self.sinks.with_lifecycle(sink);
        self
    }

    /// Replaces all three sinks at once.
    pub fn sinks(mut self, sinks: Sinks) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn cache_provider(mut self, provider: Arc<dyn CacheProvider>) -> Self {
        self.cache_provider = Some(provider);
        self
    }

    /// Sets playback, streaming and cache tuning.
    ///
    /// Default: [`PlaybackConfig::default`]
    pub fn playback_config(mut self, config: PlaybackConfig) -> Self {
        self.playback = Some(config);
        self
    }

    /// Default: [`DEFAULT_EVENT_BUS_CAPACITY`]
    pub fn event_bus_capacity(mut self, capacity: usize) -> Self {
        self.event_bus_capacity = Some(capacity);
        self
    }

    /// Install the global tracing subscriber when the service starts.
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CapabilityMissing`] when no `AudioBackendFactory` was
    ///   provided, or no `HttpClient` was provided without `desktop-shims`
    /// - [`CoreError::Config`] when validation fails
    pub fn build(self) -> Result<CoreConfig> {
        let audio_backends = self
            .audio_backends
            .ok_or_else(audio_backends_missing_error)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let config = CoreConfig {
            audio_backends,
            http_client,
            sinks: self.sinks,
            cache_provider: self.cache_provider,
            playback: self.playback.unwrap_or_default(),
            event_bus_capacity: self
                .event_bus_capacity
                .unwrap_or(DEFAULT_EVENT_BUS_CAPACITY),
            logging: self.logging,
        };

        config.validate()?;
        Ok(config)
    }
}
