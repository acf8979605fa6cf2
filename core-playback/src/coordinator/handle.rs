use super::{Mailbox, Message, PlaybackCommand, PlaybackCoordinator, PlaybackSnapshot};
use crate::config::PlaybackConfig;
use crate::engine::EngineFactory;
use crate::error::{PlaybackError, Result};
use crate::sinks::Sinks;
use crate::track::Track;
use core_runtime::events::EventBus;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Start a coordinator on the current runtime.
///
/// The coordinator runs until [`PlaybackHandle::shutdown`] or until every
/// handle has been dropped; either way playback is stopped on exit.
pub fn spawn(
    config: PlaybackConfig,
    engines: Arc<dyn EngineFactory>,
    sinks: Sinks,
    events: EventBus,
) -> Result<(PlaybackHandle, JoinHandle<()>)> {
    config.validate().map_err(PlaybackError::InvalidConfig)?;
    let runtime = Handle::try_current().map_err(|_| PlaybackError::NoRuntime)?;

    let (mailbox, inbox) = mpsc::unbounded_channel();
    let coordinator = PlaybackCoordinator::new(config, engines, sinks, events, &mailbox);
    let state = coordinator.subscribe();
    let task = runtime.spawn(run(coordinator, inbox));

    info!("Playback coordinator started");
    Ok((PlaybackHandle { mailbox, state }, task))
}

async fn run(mut coordinator: PlaybackCoordinator, mut inbox: mpsc::UnboundedReceiver<Message>) {
    loop {
        match inbox.recv().await {
            Some(message) => {
                if !coordinator.handle(message) {
                    break;
                }
            }
            None => {
                debug!("All playback handles dropped");
                coordinator.stop();
                break;
            }
        }
    }
    info!("Playback coordinator stopped");
}

/// Cloneable, non-blocking front door to a running coordinator.
///
/// Every call only enqueues; results show up in [`PlaybackHandle::snapshot`].
#[derive(Clone)]
pub struct PlaybackHandle {
    mailbox: Mailbox,
    state: watch::Receiver<PlaybackSnapshot>,
}

impl PlaybackHandle {
    pub fn play_queue(&self, tracks: Vec<Track>, start_index: usize) {
        self.send(PlaybackCommand::PlayQueue {
            tracks,
            start_index,
        });
    }

    pub fn play_track(&self, track: Track, all_tracks: Vec<Track>) {
        self.send(PlaybackCommand::PlayTrack { track, all_tracks });
    }

    pub fn skip_next(&self) {
        self.send(PlaybackCommand::SkipNext);
    }

    pub fn skip_previous(&self) {
        self.send(PlaybackCommand::SkipPrevious);
    }

    pub fn seek_to(&self, position_sec: f64) {
        self.send(PlaybackCommand::SeekTo { position_sec });
    }

    pub fn toggle_play_pause(&self) {
        self.send(PlaybackCommand::TogglePlayPause);
    }

    pub fn stop(&self) {
        self.send(PlaybackCommand::Stop);
    }

    pub fn update_track(&self, track: Track) {
        self.send(PlaybackCommand::UpdateTrack(track));
    }

    pub fn set_volume(&self, volume: f32) {
        self.send(PlaybackCommand::SetVolume(volume));
    }

    /// Stop playback and end the coordinator task. Later calls are dropped.
    pub fn shutdown(&self) {
        if self.mailbox.send(Message::Shutdown).is_err() {
            debug!("Coordinator already shut down");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.mailbox.is_closed()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.state.clone()
    }

    fn send(&self, command: PlaybackCommand) {
        if self.mailbox.send(Message::Command(command)).is_err() {
            debug!("Coordinator not running, command dropped");
        }
    }
}
