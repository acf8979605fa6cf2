//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (audio backends,
//! HTTP, media session and widget sinks) into the playback core. Desktop apps
//! typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) to get a default `HttpClient`.
//!
//! ```ignore
//! use core_service::{CoreConfig, CoreService};
//!
//! let config = CoreConfig::builder()
//!     .audio_backends(backends)
//!     .build()?;
//! let service = CoreService::start(config)?;
//! service.playback().play_queue(tracks, 0);
//! ```

pub mod config;
pub mod error;

pub use config::{CoreConfig, CoreConfigBuilder, DEFAULT_EVENT_BUS_CAPACITY};
pub use error::{CoreError, Result};

use core_playback::{BackendEngineFactory, CacheProvider, PlaybackHandle, SharedCacheProvider};
use core_runtime::events::{CoreEvent, EventBus};
use core_runtime::logging::init_logging;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

/// Primary façade exposed to host applications.
pub struct CoreService {
    playback: PlaybackHandle,
    events: EventBus,
    task: JoinHandle<()>,
}

impl CoreService {
    /// Start the playback core on the current tokio runtime.
    ///
    /// Installs logging when the config carries a [`LoggingConfig`](core_runtime::logging::LoggingConfig),
    /// then spawns the coordinator.
    pub fn start(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        if let Some(logging) = config.logging.clone() {
            init_logging(logging)?;
        }

        let events = EventBus::new(config.event_bus_capacity);
        let cache: Arc<dyn CacheProvider> = match config.cache_provider {
            Some(provider) => provider,
            None => Arc::new(SharedCacheProvider::new(config.playback.cache.clone())),
        };
        let engines = Arc::new(BackendEngineFactory::new(
            config.audio_backends,
            config.http_client,
            cache,
            config.playback.streaming.clone(),
        ));

        let (playback, task) =
            core_playback::spawn(config.playback, engines, config.sinks, events.clone())?;

        info!("Core service started");
        Ok(Self {
            playback,
            events,
            task,
        })
    }

    /// Handle for issuing playback commands and reading state.
    pub fn playback(&self) -> &PlaybackHandle {
        &self.playback
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Stop playback and wait for the coordinator to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.playback.shutdown();
        self.task
            .await
            .map_err(|e| CoreError::Internal(format!("Coordinator task failed: {}", e)))?;
        info!("Core service stopped");
        Ok(())
    }
}
