//! # Playback Error Types
//!
//! Every failure the playback core can observe, grouped by the stage at which
//! it happens. [`PlaybackError::kind`] maps a value onto the three policies the
//! coordinator applies:
//!
//! | Kind | When | Coordinator reaction |
//! |------|------|----------------------|
//! | [`FailureKind::Load`] | before the engine is ready, or a failed stream fetch | terminal for the track |
//! | [`FailureKind::Playback`] | a transport call fails after ready | `is_playing = false`, engine kept |
//! | [`FailureKind::Engine`] | asynchronous failure after ready | terminal for the track |

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Load Errors
    // ========================================================================
    /// The backend could not open or prepare the source.
    #[error("Failed to load track: {0}")]
    LoadFailed(String),

    /// The track locator cannot be turned into a source.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// The host could not provide an audio backend.
    #[error("Audio backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Engine work was requested outside a Tokio runtime.
    #[error("No async runtime available for engine work")]
    NoRuntime,

    /// Fetching remote bytes failed.
    #[error("Streaming failed: {0}")]
    StreamingFailed(String),

    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// Playback stopped with an error after the track was ready.
    #[error("Playback interrupted: {0}")]
    Interrupted(String),

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// A transport call on the backend failed.
    #[error("Backend operation failed: {0}")]
    Backend(#[from] BridgeError),

    /// Attempted operation before a backend exists.
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Attempted operation on a released engine.
    #[error("Engine already released")]
    EngineReleased,

    // ========================================================================
    // Cache Errors
    // ========================================================================
    /// The network cache could not be constructed or is disabled.
    #[error("Network cache unavailable: {0}")]
    CacheUnavailable(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure stage, see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Load,
    Playback,
    Engine,
}

impl PlaybackError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PlaybackError::LoadFailed(_)
            | PlaybackError::UnsupportedSource(_)
            | PlaybackError::BackendUnavailable(_)
            | PlaybackError::NoRuntime
            | PlaybackError::StreamingFailed(_)
            | PlaybackError::CacheUnavailable(_)
            | PlaybackError::InvalidConfig(_) => FailureKind::Load,
            PlaybackError::Backend(_)
            | PlaybackError::NoTrackLoaded
            | PlaybackError::EngineReleased => FailureKind::Playback,
            PlaybackError::Interrupted(_) | PlaybackError::Internal(_) => FailureKind::Engine,
        }
    }

    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        match self {
            PlaybackError::StreamingFailed(_) => true,
            PlaybackError::Backend(inner) => inner.is_transient(),
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
