//! # Engine Adapters
//!
//! One polymorphic [`Engine`] interface wraps a single platform decode/output
//! resource. Variants are picked from the track locator by [`select_engine`]:
//!
//! | Scheme | Variant |
//! |--------|---------|
//! | `http`, `https` | [`EngineKind::Streaming`] |
//! | anything else, bare paths included | [`EngineKind::Local`] |
//!
//! ## Events
//!
//! Each engine instance owns one [`EngineEvents`] channel and reports through
//! it, never by returning errors from [`Engine::load`]:
//!
//! ```text
//! load() ──► Ready(duration) ──► Ended
//!    │                      └──► Error(e)
//!    └────► Error(e)
//! ```
//!
//! Events carry the emitting [`EngineId`] so the coordinator can discard
//! anything still in flight from an engine it has already torn down.

mod driver;
mod factory;
mod local;
mod streaming;

pub use driver::{BackendEngine, SourceResolver};
pub use factory::BackendEngineFactory;
pub use local::{local_source, LocalEngine, LocalSource};
pub use streaming::{StreamingEngine, StreamingSource};

use crate::error::{PlaybackError, Result};
use crate::track::{uri_scheme, Track};
use bridge_traits::playback::BackendKind;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// Identity & Selection
// ============================================================================

/// Unique identity of one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId(Uuid);

impl EngineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EngineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Local,
    Streaming,
}

impl EngineKind {
    pub fn backend_kind(self) -> BackendKind {
        match self {
            EngineKind::Local => BackendKind::Local,
            EngineKind::Streaming => BackendKind::Streaming,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Local => "local",
            EngineKind::Streaming => "streaming",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the engine variant for a track locator.
pub fn select_engine(uri: &str) -> EngineKind {
    match uri_scheme(uri).as_deref() {
        Some("http") | Some("https") => EngineKind::Streaming,
        _ => EngineKind::Local,
    }
}

// ============================================================================
// Events
// ============================================================================

/// Asynchronous outcome reported by an engine.
#[derive(Debug)]
pub enum EngineEvent {
    /// Prepared and playable. `duration` is `None` when the container does
    /// not report one.
    Ready { duration: Option<Duration> },
    /// Natural end of media.
    Ended,
    /// Load failure before ready, or asynchronous failure after it.
    Error(PlaybackError),
}

/// Callback that moves an event onto the coordinator's serialization context.
pub type EventDispatch = Arc<dyn Fn(EngineId, EngineEvent) + Send + Sync>;

/// Per-instance event channel handed to an engine at construction.
#[derive(Clone)]
pub struct EngineEvents {
    engine_id: EngineId,
    dispatch: EventDispatch,
}

impl EngineEvents {
    pub fn new(engine_id: EngineId, dispatch: EventDispatch) -> Self {
        Self {
            engine_id,
            dispatch,
        }
    }

    pub fn engine_id(&self) -> EngineId {
        self.engine_id
    }

    pub fn ready(&self, duration: Option<Duration>) {
        (self.dispatch)(self.engine_id, EngineEvent::Ready { duration });
    }

    pub fn ended(&self) {
        (self.dispatch)(self.engine_id, EngineEvent::Ended);
    }

    pub fn error(&self, error: PlaybackError) {
        (self.dispatch)(self.engine_id, EngineEvent::Error(error));
    }
}

impl fmt::Debug for EngineEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineEvents")
            .field("engine_id", &self.engine_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Engine Contract
// ============================================================================

/// Uniform control surface over one platform playback resource.
///
/// Construction and [`Engine::load`] never fail synchronously. Transport
/// calls return quickly and report failures as `Err` so the coordinator can
/// degrade `is_playing` without tearing the engine down. An engine that never
/// reached ready must still be safe to stop, reset and release.
pub trait Engine: Send + Sync {
    fn id(&self) -> EngineId;

    fn kind(&self) -> EngineKind;

    /// Begin preparing `track`. Results arrive later as [`EngineEvent`]s.
    fn load(&self, track: &Track, autoplay: bool);

    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    /// Seek to `position_ms`. Before ready the target is kept and applied
    /// once the backend is prepared.
    fn seek(&self, position_ms: u64) -> Result<()>;

    fn set_volume(&self, volume: f32) -> Result<()>;

    fn stop(&self) -> Result<()>;

    fn reset(&self) -> Result<()>;

    /// Free the platform resource. Idempotent.
    fn release(&self) -> Result<()>;

    /// Raw position reading; negative when unknown.
    fn current_position_ms(&self) -> i64;

    /// Raw duration reading; negative when unknown.
    fn duration_ms(&self) -> i64;
}

/// Builds engines for the coordinator.
///
/// Must not block: any slow setup belongs inside the engine's own
/// asynchronous load path.
pub trait EngineFactory: Send + Sync {
    fn create(&self, kind: EngineKind, events: EngineEvents) -> Arc<dyn Engine>;
}
