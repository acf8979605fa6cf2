//! Playback bridge traits and supporting audio types.
//!
//! A host provides one [`AudioBackendFactory`]; the core asks it for a fresh
//! [`AudioBackend`] every time a track is loaded and releases that backend
//! before asking for the next one. Decoding and audio output stay entirely on
//! the host side. The core only drives the lifecycle and reads position.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Random-access byte source for network media.
///
/// The streaming engine hands backends a reader instead of a bare URL so that
/// every byte goes through the core's cache.
#[async_trait]
pub trait StreamReader: Send + Sync {
    /// Read up to `length` bytes starting at `offset`.
    ///
    /// A short read only happens at the end of the resource; an empty buffer
    /// means `offset` is at or past the end.
    async fn read_at(&self, offset: u64, length: usize) -> Result<Bytes>;
}

/// High-level audio source descriptor provided to backends.
#[derive(Clone)]
pub enum AudioSource {
    /// Local file accessible to the host runtime.
    LocalFile { path: PathBuf },
    /// Platform content reference the host resolves itself
    /// (`content://`, `file://`, `ipod-library://`, ...).
    ContentUri { uri: String },
    /// Remote HTTP(S) resource served through a [`StreamReader`].
    Stream {
        url: String,
        reader: Arc<dyn StreamReader>,
    },
}

impl AudioSource {
    /// Determine whether the source represents remote content.
    pub fn is_remote(&self) -> bool {
        matches!(self, AudioSource::Stream { .. })
    }
}

impl fmt::Debug for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::LocalFile { path } => {
                f.debug_struct("LocalFile").field("path", path).finish()
            }
            AudioSource::ContentUri { uri } => {
                f.debug_struct("ContentUri").field("uri", uri).finish()
            }
            AudioSource::Stream { url, .. } => f
                .debug_struct("Stream")
                .field("url", url)
                .finish_non_exhaustive(),
        }
    }
}

/// Buffering thresholds a backend should apply to network sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferingPolicy {
    /// Keep at least this much media buffered ahead of the playhead.
    pub min_buffer: Duration,
    /// Stop fetching once this much is buffered.
    pub max_buffer: Duration,
    /// Media required before the first frame plays.
    pub buffer_for_playback: Duration,
    /// Media required before resuming after a stall.
    pub buffer_for_playback_after_rebuffer: Duration,
}

/// Options supplied alongside [`AudioBackend::prepare`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrepareOptions {
    /// Hint that playback will start as soon as the backend is ready.
    /// The core still issues an explicit [`AudioBackend::play`], and calls
    /// [`AudioBackend::pause`] right after ready if the user paused while the
    /// backend was preparing.
    pub play_when_ready: bool,
    /// Initial volume (0.0 = muted, 1.0 = unity gain).
    pub initial_volume: f32,
    /// Buffering thresholds; `None` for local media.
    pub buffering: Option<BufferingPolicy>,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            play_when_ready: false,
            initial_volume: 1.0,
            buffering: None,
        }
    }
}

/// Which kind of host player the core wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Local,
    Streaming,
}

/// One platform decode/output resource.
///
/// Control methods are synchronous and must return quickly; they are invoked
/// from the playback coordinator's serialization context. Position readings
/// are raw platform values and may be negative when unknown.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Open `source` and buffer until playable. Resolves with the media
    /// duration when the container reports one.
    async fn prepare(&self, source: AudioSource, options: PrepareOptions)
        -> Result<Option<Duration>>;

    /// Resolves `Ok(())` when playback reaches the natural end of the media,
    /// or an error if playback fails after [`AudioBackend::prepare`] succeeded.
    async fn wait_for_completion(&self) -> Result<()>;

    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn seek(&self, position: Duration) -> Result<()>;

    fn set_volume(&self, volume: f32) -> Result<()>;

    fn stop(&self) -> Result<()>;

    /// Return to the unprepared state.
    fn reset(&self) -> Result<()>;

    /// Free native resources. No other method is called afterwards.
    fn release(&self) -> Result<()>;

    fn position_ms(&self) -> i64;

    fn duration_ms(&self) -> i64;
}

/// Produces backends on demand.
pub trait AudioBackendFactory: Send + Sync {
    fn create(&self, kind: BackendKind) -> Result<Arc<dyn AudioBackend>>;
}
