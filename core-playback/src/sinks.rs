//! # Output Sinks
//!
//! Passive consumers the coordinator pushes state into. None of them can
//! call back into playback. Every call must be cheap and idempotent;
//! implementations that need to do real work should hand it off.
//!
//! | Sink | Called on |
//! |------|-----------|
//! | [`MediaSessionSink`] | every phase transition and every progress tick |
//! | [`WidgetSink`] | track or play-state changes (fire-and-forget) |
//! | [`ForegroundLifecycleSink`] | `start` on first transition into playing, `update` on ticks and toggles, `stop` when the queue drains or playback stops |

use crate::track::Track;
use std::sync::Arc;

/// Lock-screen / system transport controls.
pub trait MediaSessionSink: Send + Sync {
    fn update(&self, track: Option<&Track>, is_playing: bool, position_ms: u64, duration_ms: u64);
}

/// Home-screen widget.
pub trait WidgetSink: Send + Sync {
    fn push(&self, track: Option<&Track>, is_playing: bool);
}

/// Keeps the host process in the foreground while audio plays.
pub trait ForegroundLifecycleSink: Send + Sync {
    fn start(&self);

    fn update(&self);

    fn stop(&self);
}

/// Sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MediaSessionSink for NoopSink {
    fn update(&self, _track: Option<&Track>, _is_playing: bool, _position_ms: u64, _duration_ms: u64) {}
}

impl WidgetSink for NoopSink {
    fn push(&self, _track: Option<&Track>, _is_playing: bool) {}
}

impl ForegroundLifecycleSink for NoopSink {
    fn start(&self) {}

    fn update(&self) {}

    fn stop(&self) {}
}

/// The three sinks the coordinator drives. Missing sinks default to no-ops.
#[derive(Clone)]
pub struct Sinks {
    pub session: Arc<dyn MediaSessionSink>,
    pub widget: Arc<dyn WidgetSink>,
    pub lifecycle: Arc<dyn ForegroundLifecycleSink>,
}

impl Sinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session: Arc<dyn MediaSessionSink>) -> Self {
        self.session = session;
        self
    }

    pub fn with_widget(mut self, widget: Arc<dyn WidgetSink>) -> Self {
        self.widget = widget;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn ForegroundLifecycleSink>) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

impl Default for Sinks {
    fn default() -> Self {
        Self {
            session: Arc::new(NoopSink),
            widget: Arc::new(NoopSink),
            lifecycle: Arc::new(NoopSink),
        }
    }
}

impl std::fmt::Debug for Sinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sinks").finish_non_exhaustive()
    }
}
