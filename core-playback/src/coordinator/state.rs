//! Published playback state.

use crate::track::Track;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Explicit playback state machine.
///
/// ```text
/// Idle ──► Loading ──► Ready ──► Playing ⇄ Paused
///            ▲                     │
///            │                     ├──► Ended ──► Loading (next entry)
///            │                     └──► Failed
///            └──────── (any) ── stop ──► Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    #[default]
    Idle,
    /// Engine created, waiting for ready.
    Loading,
    /// Prepared but not started.
    Ready,
    Playing,
    Paused,
    /// Last queue entry finished naturally. The engine is kept so the track
    /// can be replayed.
    Ended,
    /// Terminal failure for the current entry.
    Failed,
}

impl PlaybackPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackPhase::Idle => "idle",
            PlaybackPhase::Loading => "loading",
            PlaybackPhase::Ready => "ready",
            PlaybackPhase::Playing => "playing",
            PlaybackPhase::Paused => "paused",
            PlaybackPhase::Ended => "ended",
            PlaybackPhase::Failed => "failed",
        }
    }

    /// Ready, playing or paused: the engine accepts transport calls.
    pub fn is_prepared(self) -> bool {
        matches!(
            self,
            PlaybackPhase::Ready | PlaybackPhase::Playing | PlaybackPhase::Paused
        )
    }
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position and duration in seconds. `(0, 0)` whenever no engine is live.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub position_sec: f64,
    pub duration_sec: f64,
}

impl Progress {
    pub fn from_millis(position_ms: u64, duration_ms: u64) -> Self {
        Self {
            position_sec: position_ms as f64 / 1000.0,
            duration_sec: duration_ms as f64 / 1000.0,
        }
    }

    pub fn position_ms(&self) -> u64 {
        seconds_to_millis(self.position_sec)
    }

    pub fn duration_ms(&self) -> u64 {
        seconds_to_millis(self.duration_sec)
    }
}

pub(crate) fn seconds_to_millis(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// Everything observers can see, published after each state change.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub current_track: Option<Track>,
    pub queue: Arc<Vec<Track>>,
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub progress: Progress,
    pub volume: f32,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            current_track: None,
            queue: Arc::new(Vec::new()),
            current_index: None,
            is_playing: false,
            progress: Progress::default(),
            volume: 1.0,
        }
    }
}
