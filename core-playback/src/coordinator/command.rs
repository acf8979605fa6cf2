use crate::engine::{EngineEvent, EngineId};
use crate::sampler::ProgressReading;
use crate::track::Track;
use tokio::sync::mpsc;

/// User-facing operations.
#[derive(Debug, Clone)]
pub enum PlaybackCommand {
    PlayQueue { tracks: Vec<Track>, start_index: usize },
    PlayTrack { track: Track, all_tracks: Vec<Track> },
    SkipNext,
    SkipPrevious,
    SeekTo { position_sec: f64 },
    TogglePlayPause,
    Stop,
    UpdateTrack(Track),
    SetVolume(f32),
}

/// Everything processed on the coordinator's serialization context, in
/// arrival order.
#[derive(Debug)]
pub enum Message {
    Command(PlaybackCommand),
    Engine {
        engine_id: EngineId,
        event: EngineEvent,
    },
    Tick {
        engine_id: EngineId,
        reading: ProgressReading,
    },
    /// Stop playback and end the run loop.
    Shutdown,
}

impl From<PlaybackCommand> for Message {
    fn from(command: PlaybackCommand) -> Self {
        Message::Command(command)
    }
}

/// Sending half of the coordinator's queue.
pub type Mailbox = mpsc::UnboundedSender<Message>;
