//! # Playback Coordination
//!
//! Queue handling, engine dispatch and progress publishing for local and
//! streamed audio.
//!
//! ## Overview
//!
//! - [`coordinator`]: the [`PlaybackCoordinator`] state machine and its
//!   task runner ([`spawn`] / [`PlaybackHandle`])
//! - [`engine`]: the [`Engine`] contract, [`select_engine`] and the local and
//!   streaming variants over a host [`AudioBackend`](bridge_traits::AudioBackend)
//! - [`cache`]: the process-wide LRU [`NetworkCache`] used by streaming
//! - [`sampler`]: the periodic [`ProgressSampler`]
//! - [`sinks`]: push contracts for session, widget and foreground lifecycle
//!
//! ```rust,no_run
//! use core_playback::{spawn, BackendEngineFactory, PlaybackConfig, SharedCacheProvider, Sinks, Track};
//! use core_runtime::events::EventBus;
//! use std::sync::Arc;
//! # fn host() -> (Arc<dyn bridge_traits::AudioBackendFactory>, Arc<dyn bridge_traits::HttpClient>) { unimplemented!() }
//!
//! # async fn example() -> core_playback::Result<()> {
//! let (backends, http) = host();
//! let config = PlaybackConfig::default();
//! let engines = Arc::new(BackendEngineFactory::new(
//!     backends,
//!     http,
//!     Arc::new(SharedCacheProvider::new(config.cache.clone())),
//!     config.streaming.clone(),
//! ));
//! let (playback, _task) = spawn(config, engines, Sinks::default(), EventBus::new(64))?;
//!
//! playback.play_queue(
//!     vec![
//!         Track::new("t1", "/music/one.flac"),
//!         Track::new("t2", "https://cdn.example.com/two.mp3"),
//!     ],
//!     0,
//! );
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod sampler;
pub mod sinks;
pub mod streaming;
pub mod track;

pub use cache::{
    ByteCache, CacheConfig, CacheProvider, CacheStats, FixedCacheProvider, NetworkCache,
    SharedCacheProvider,
};
pub use config::{PlaybackConfig, StreamingConfig};
pub use coordinator::{
    spawn, Mailbox, Message, PlaybackCommand, PlaybackCoordinator, PlaybackHandle, PlaybackPhase,
    PlaybackSnapshot, Progress,
};
pub use engine::{
    select_engine, BackendEngineFactory, Engine, EngineEvent, EngineEvents, EngineFactory,
    EngineId, EngineKind, LocalEngine, StreamingEngine,
};
pub use error::{FailureKind, PlaybackError, Result};
pub use sampler::{ProgressReading, ProgressSampler};
pub use sinks::{ForegroundLifecycleSink, MediaSessionSink, NoopSink, Sinks, WidgetSink};
pub use streaming::CachedStreamReader;
pub use track::Track;
