//! # Playback Coordinator
//!
//! Owns the queue, the current engine and its progress sampler, and turns
//! user commands, engine events and sampler ticks into published state and
//! sink notifications.
//!
//! ## Serialization
//!
//! [`PlaybackCoordinator`] is a plain state machine: every method runs to
//! completion on `&mut self`. Engines and samplers never touch it directly.
//! They post [`Message`]s into the coordinator's mailbox, and the owner
//! (normally the task started by [`spawn`]) feeds them back through
//! [`PlaybackCoordinator::handle`] one at a time.
//!
//! ## Single flight
//!
//! At most one engine and one sampler are held at any time. Every track
//! switch, stop and failure runs the teardown sequence before anything new is
//! created:
//!
//! 1. drop the sampler (synchronous cancel)
//! 2. `stop`, `reset`, `release` on the engine, each step guarded on its own
//!
//! Messages from an engine that is no longer current are discarded by
//! [`EngineId`].

mod command;
mod handle;
mod state;

pub use command::{Mailbox, Message, PlaybackCommand};
pub use handle::{spawn, PlaybackHandle};
pub use state::{PlaybackPhase, PlaybackSnapshot, Progress};

use crate::config::PlaybackConfig;
use crate::engine::{
    select_engine, Engine, EngineEvent, EngineEvents, EngineFactory, EngineId, EventDispatch,
};
use crate::error::PlaybackError;
use crate::sampler::{ProgressReading, ProgressReport, ProgressSampler};
use crate::sinks::Sinks;
use crate::track::Track;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, QueueEvent};
use state::seconds_to_millis;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

struct ActiveEngine {
    id: EngineId,
    engine: Arc<dyn Engine>,
    ready: bool,
    /// Start intent handed to the backend at load time.
    autoplay: bool,
}

/// Queue/engine state machine. See the module docs.
pub struct PlaybackCoordinator {
    config: PlaybackConfig,
    engines: Arc<dyn EngineFactory>,
    sinks: Sinks,
    events: EventBus,
    mailbox: mpsc::WeakUnboundedSender<Message>,
    published: watch::Sender<PlaybackSnapshot>,

    phase: PlaybackPhase,
    queue: Arc<Vec<Track>>,
    current_index: Option<usize>,
    current_track: Option<Track>,
    is_playing: bool,
    progress: Progress,
    volume: f32,
    play_when_ready: bool,
    foreground_active: bool,

    engine: Option<ActiveEngine>,
    sampler: Option<ProgressSampler>,
}

impl PlaybackCoordinator {
    /// Engines and samplers report through `mailbox`. The coordinator keeps
    /// only a weak reference to it, so the queue closes once every other
    /// sender is gone.
    pub fn new(
        config: PlaybackConfig,
        engines: Arc<dyn EngineFactory>,
        sinks: Sinks,
        events: EventBus,
        mailbox: &Mailbox,
    ) -> Self {
        let (published, _) = watch::channel(PlaybackSnapshot::default());
        Self {
            config,
            engines,
            sinks,
            events,
            mailbox: mailbox.downgrade(),
            published,
            phase: PlaybackPhase::Idle,
            queue: Arc::new(Vec::new()),
            current_index: None,
            current_track: None,
            is_playing: false,
            progress: Progress::default(),
            volume: 1.0,
            play_when_ready: false,
            foreground_active: false,
            engine: None,
            sampler: None,
        }
    }

    // ========================================================================
    // Observation
    // ========================================================================

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            phase: self.phase,
            current_track: self.current_track.clone(),
            queue: self.queue.clone(),
            current_index: self.current_index,
            is_playing: self.is_playing,
            progress: self.progress,
            volume: self.volume,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.published.subscribe()
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// `(engines, samplers)` currently held. Each is 0 or 1.
    pub fn live_resources(&self) -> (usize, usize) {
        (
            usize::from(self.engine.is_some()),
            usize::from(self.sampler.is_some()),
        )
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Process one message. Returns `false` once the coordinator has shut
    /// down.
    pub fn handle(&mut self, message: Message) -> bool {
        match message {
            Message::Command(command) => self.execute(command),
            Message::Engine { engine_id, event } => self.on_engine_event(engine_id, event),
            Message::Tick { engine_id, reading } => self.on_tick(engine_id, reading),
            Message::Shutdown => {
                info!("Playback coordinator shutting down");
                self.stop();
                return false;
            }
        }
        true
    }

    pub fn execute(&mut self, command: PlaybackCommand) {
        debug!(?command, "Playback command");
        match command {
            PlaybackCommand::PlayQueue {
                tracks,
                start_index,
            } => self.play_queue(tracks, start_index),
            PlaybackCommand::PlayTrack { track, all_tracks } => {
                self.play_track(track, all_tracks)
            }
            PlaybackCommand::SkipNext => self.skip_next(),
            PlaybackCommand::SkipPrevious => self.skip_previous(),
            PlaybackCommand::SeekTo { position_sec } => self.seek_to(position_sec),
            PlaybackCommand::TogglePlayPause => self.toggle_play_pause(),
            PlaybackCommand::Stop => self.stop(),
            PlaybackCommand::UpdateTrack(track) => self.update_track(track),
            PlaybackCommand::SetVolume(volume) => self.set_volume(volume),
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Replace the queue with the playable entries of `tracks` and start at
    /// `start_index`, clamped into the filtered queue.
    pub fn play_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        let offered = tracks.len();
        let queue: Vec<Track> = tracks
            .into_iter()
            .filter(Track::has_playable_uri)
            .collect();

        if queue.is_empty() {
            info!(offered, "No playable tracks in queue, stopping");
            self.stop();
            return;
        }
        if queue.len() < offered {
            debug!(
                dropped = offered - queue.len(),
                "Dropped tracks without a locator"
            );
        }

        let index = start_index.min(queue.len() - 1);
        self.queue = Arc::new(queue);
        self.emit(CoreEvent::Queue(QueueEvent::Replaced {
            length: self.queue.len(),
            start_index: index,
        }));
        self.load_and_play(index, true);
    }

    /// Play `track` within `all_tracks`, or alone when it is not part of it.
    pub fn play_track(&mut self, track: Track, all_tracks: Vec<Track>) {
        let playable: Vec<Track> = all_tracks
            .into_iter()
            .filter(Track::has_playable_uri)
            .collect();

        match playable.iter().position(|candidate| candidate.id == track.id) {
            Some(index) => self.play_queue(playable, index),
            None => {
                debug!(track_id = %track.id, "Track not in list, playing alone");
                self.play_queue(vec![track], 0);
            }
        }
    }

    pub fn skip_next(&mut self) {
        match self.current_index {
            Some(index) if index + 1 < self.queue.len() => self.load_and_play(index + 1, true),
            _ => debug!("Already at end of queue"),
        }
    }

    /// Restart the current track past the threshold, otherwise step back.
    pub fn skip_previous(&mut self) {
        if self.current_track.is_some()
            && self.progress.position_sec >= self.config.restart_threshold.as_secs_f64()
        {
            debug!(
                position_sec = self.progress.position_sec,
                "Restarting current track"
            );
            self.seek_to(0.0);
            return;
        }

        match self.current_index {
            Some(index) if index > 0 => self.load_and_play(index - 1, true),
            _ => debug!("Already at start of queue"),
        }
    }

    /// Seek and publish the clamped target right away.
    pub fn seek_to(&mut self, position_sec: f64) {
        let Some(track_id) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            debug!("Seek ignored, nothing loaded");
            return;
        };

        let target = clamp_seek(position_sec, self.progress.duration_sec);
        let target_ms = seconds_to_millis(target);

        if let Some(active) = &self.engine {
            if let Err(e) = active.engine.seek(target_ms) {
                warn!(error = %e, position_ms = target_ms, "Engine seek failed");
                self.degrade_playback(&e);
            }
        }

        self.progress.position_sec = target;
        self.publish();
        self.notify_session();
        self.emit(CoreEvent::Playback(PlaybackEvent::Seeked {
            track_id: Some(track_id),
            position_ms: target_ms,
        }));
    }

    /// Pause or resume the current engine. Never fails; a refused transport
    /// call leaves `is_playing = false`.
    pub fn toggle_play_pause(&mut self) {
        if self.engine.is_none() {
            debug!("Toggle ignored, no engine");
            return;
        }

        match self.phase {
            PlaybackPhase::Loading => {
                self.play_when_ready = !self.play_when_ready;
                debug!(
                    play_when_ready = self.play_when_ready,
                    "Toggled pending start"
                );
                self.sinks.lifecycle.update();
                self.publish();
                return;
            }
            PlaybackPhase::Ended => {
                if let Some(index) = self.current_index {
                    self.load_and_play(index, true);
                }
                self.sinks.lifecycle.update();
                return;
            }
            _ => {}
        }

        if self.is_playing {
            self.pause_playback();
        } else {
            self.start_playback();
        }

        self.sinks.lifecycle.update();
        self.publish();
        self.notify_session();
        self.notify_widget();
    }

    /// Tear everything down and return to `Idle`.
    pub fn stop(&mut self) {
        let track_id = self.current_track.as_ref().map(|t| t.id.clone());
        self.teardown();

        self.queue = Arc::new(Vec::new());
        self.current_index = None;
        self.current_track = None;
        self.is_playing = false;
        self.progress = Progress::default();
        self.play_when_ready = false;
        self.phase = PlaybackPhase::Idle;

        self.publish();
        self.sinks.session.update(None, false, 0, 0);
        self.sinks.widget.push(None, false);
        self.stop_foreground();
        info!(track_id = ?track_id, "Playback stopped");
        self.emit(CoreEvent::Playback(PlaybackEvent::Stopped { track_id }));
    }

    /// Replace metadata for every entry sharing `updated.id`. Never reloads.
    pub fn update_track(&mut self, updated: Track) {
        let mut changed = false;

        if let Some(current) = self.current_track.as_mut() {
            if current.id == updated.id {
                *current = updated.clone();
                changed = true;
            }
        }

        if self.queue.iter().any(|t| t.id == updated.id) {
            for entry in Arc::make_mut(&mut self.queue).iter_mut() {
                if entry.id == updated.id {
                    *entry = updated.clone();
                }
            }
            changed = true;
        }

        if !changed {
            trace!(track_id = %updated.id, "Metadata patch matched nothing");
            return;
        }

        self.publish();
        self.notify_session();
        self.notify_widget();
    }

    /// Clamp to `[0, 1]` and apply to the current and all later engines.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.volume = volume;

        if let Some(active) = &self.engine {
            if let Err(e) = active.engine.set_volume(volume) {
                warn!(error = %e, "Engine volume change failed");
            }
        }

        self.publish();
        self.emit(CoreEvent::Playback(PlaybackEvent::VolumeChanged {
            percent: (volume * 100.0).round() as u8,
        }));
    }

    // ========================================================================
    // Load & Play
    // ========================================================================

    fn load_and_play(&mut self, index: usize, play_when_ready: bool) {
        let Some(track) = self.queue.get(index).cloned() else {
            warn!(index, len = self.queue.len(), "Queue index out of range");
            return;
        };

        if play_when_ready && self.is_resume_of(index, &track) {
            debug!(track_id = %track.id, "Resuming instead of reloading");
            self.toggle_play_pause();
            return;
        }

        self.teardown();

        self.current_index = Some(index);
        self.current_track = Some(track.clone());
        self.is_playing = false;
        self.progress = Progress::default();
        self.play_when_ready = play_when_ready;
        self.phase = PlaybackPhase::Loading;

        let kind = select_engine(&track.uri);
        let id = EngineId::new();
        let engine = self
            .engines
            .create(kind, EngineEvents::new(id, self.engine_dispatch()));
        if let Err(e) = engine.set_volume(self.volume) {
            warn!(error = %e, "Initial volume rejected");
        }
        self.engine = Some(ActiveEngine {
            id,
            engine: engine.clone(),
            ready: false,
            autoplay: play_when_ready,
        });

        info!(
            track_id = %track.id,
            index,
            engine = %kind,
            play_when_ready,
            "Loading track"
        );
        self.emit(CoreEvent::Queue(QueueEvent::IndexChanged {
            index,
            track_id: track.id.clone(),
        }));
        self.emit(CoreEvent::Playback(PlaybackEvent::TrackLoading {
            track_id: track.id.clone(),
            engine: kind.to_string(),
        }));

        self.publish();
        self.notify_session();
        self.notify_widget();

        engine.load(&track, play_when_ready);
    }

    /// Same entry, live engine, merely not playing.
    fn is_resume_of(&self, index: usize, track: &Track) -> bool {
        self.current_index == Some(index)
            && self
                .current_track
                .as_ref()
                .is_some_and(|current| current.id == track.id)
            && !self.is_playing
            && self.engine.is_some()
            && self.phase.is_prepared()
    }

    fn teardown(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            drop(sampler);
        }

        if let Some(active) = self.engine.take() {
            let engine = active.engine;
            if let Err(e) = engine.stop() {
                warn!(engine = %active.id, error = %e, "Engine stop failed");
            }
            if let Err(e) = engine.reset() {
                warn!(engine = %active.id, error = %e, "Engine reset failed");
            }
            if let Err(e) = engine.release() {
                warn!(engine = %active.id, error = %e, "Engine release failed");
            }
            debug!(engine = %active.id, "Engine torn down");
        }
    }

    fn start_playback(&mut self) {
        let Some(active) = &self.engine else {
            return;
        };

        match active.engine.play() {
            Ok(()) => {
                let resumed = self.phase == PlaybackPhase::Paused;
                self.is_playing = true;
                self.phase = PlaybackPhase::Playing;
                if !self.foreground_active {
                    self.sinks.lifecycle.start();
                    self.foreground_active = true;
                }

                let Some(track) = &self.current_track else {
                    return;
                };
                let event = if resumed {
                    PlaybackEvent::Resumed {
                        track_id: track.id.clone(),
                        position_ms: self.progress.position_ms(),
                    }
                } else {
                    PlaybackEvent::Started {
                        track_id: track.id.clone(),
                        title: track.title.clone(),
                    }
                };
                self.emit(CoreEvent::Playback(event));
            }
            Err(e) => {
                warn!(error = %e, "Engine refused to play");
                self.degrade_playback(&e);
            }
        }
    }

    fn pause_playback(&mut self) {
        let Some(active) = &self.engine else {
            return;
        };

        if let Err(e) = active.engine.pause() {
            warn!(error = %e, "Engine refused to pause");
            self.degrade_playback(&e);
            return;
        }

        self.is_playing = false;
        self.phase = PlaybackPhase::Paused;
        if let Some(track) = &self.current_track {
            let event = PlaybackEvent::Paused {
                track_id: track.id.clone(),
                position_ms: self.progress.position_ms(),
            };
            self.emit(CoreEvent::Playback(event));
        }
    }

    /// Transport failure after ready: keep the engine, stop claiming to play.
    fn degrade_playback(&mut self, error: &PlaybackError) {
        self.is_playing = false;
        if self.phase == PlaybackPhase::Playing {
            self.phase = PlaybackPhase::Paused;
        }
        self.emit(CoreEvent::Playback(PlaybackEvent::Error {
            track_id: self.current_track.as_ref().map(|t| t.id.clone()),
            message: error.to_string(),
            recoverable: true,
        }));
    }

    // ========================================================================
    // Engine Events
    // ========================================================================

    pub fn on_engine_event(&mut self, engine_id: EngineId, event: EngineEvent) {
        if self.engine.as_ref().map(|active| active.id) != Some(engine_id) {
            trace!(engine = %engine_id, ?event, "Discarding event from stale engine");
            return;
        }

        match event {
            EngineEvent::Ready { duration } => self.on_ready(duration),
            EngineEvent::Ended => self.on_ended(),
            EngineEvent::Error(e) => self.on_error(e),
        }
    }

    fn on_ready(&mut self, duration: Option<Duration>) {
        let (engine, autoplay) = match self.engine.as_mut() {
            Some(active) if !active.ready => {
                active.ready = true;
                (active.engine.clone(), active.autoplay)
            }
            _ => {
                debug!("Duplicate ready ignored");
                return;
            }
        };

        let reported_ms = duration.map_or(0, |d| d.as_millis() as u64);
        let duration_ms = if reported_ms > 0 {
            reported_ms
        } else {
            self.current_track
                .as_ref()
                .and_then(|t| t.advisory_duration_ms)
                .unwrap_or(0)
        };
        self.progress.duration_sec = duration_ms as f64 / 1000.0;
        self.phase = PlaybackPhase::Ready;
        info!(engine = %engine.id(), duration_ms, "Track ready");

        if self.play_when_ready {
            self.start_playback();
        } else if autoplay {
            // Paused while loading: withdraw the start hint given to the backend.
            if let Err(e) = engine.pause() {
                warn!(error = %e, "Engine refused to hold at ready");
            }
        }

        self.sampler = None;
        match ProgressSampler::spawn(&engine, self.config.sample_interval, self.tick_report()) {
            Ok(sampler) => self.sampler = Some(sampler),
            Err(e) => warn!(error = %e, "Progress sampling unavailable"),
        }

        self.publish();
        self.notify_session();
        self.notify_widget();
    }

    fn on_ended(&mut self) {
        self.is_playing = false;
        if let Some(track) = &self.current_track {
            let event = PlaybackEvent::Completed {
                track_id: track.id.clone(),
            };
            self.emit(CoreEvent::Playback(event));
        }

        if let Some(index) = self.current_index {
            if index + 1 < self.queue.len() {
                info!(next = index + 1, "Advancing to next track");
                self.load_and_play(index + 1, true);
                return;
            }
        }

        // Queue drained: keep the engine so the last track can be replayed.
        self.sampler = None;
        self.phase = PlaybackPhase::Ended;
        info!(length = self.queue.len(), "Queue finished");

        self.publish();
        self.notify_session();
        self.notify_widget();
        self.stop_foreground();
        self.emit(CoreEvent::Queue(QueueEvent::Finished {
            length: self.queue.len(),
        }));
    }

    fn on_error(&mut self, failure: PlaybackError) {
        let track_id = self.current_track.as_ref().map(|t| t.id.clone());
        error!(
            track_id = ?track_id,
            kind = ?failure.kind(),
            error = %failure,
            "Track failed"
        );

        self.teardown();
        self.current_track = None;
        self.is_playing = false;
        self.progress = Progress::default();
        self.play_when_ready = false;
        self.phase = PlaybackPhase::Failed;

        self.publish();
        self.sinks.session.update(None, false, 0, 0);
        self.sinks.widget.push(None, false);
        self.stop_foreground();
        self.emit(CoreEvent::Playback(PlaybackEvent::Error {
            track_id,
            message: failure.to_string(),
            recoverable: false,
        }));
    }

    pub fn on_tick(&mut self, engine_id: EngineId, reading: ProgressReading) {
        let current = self
            .sampler
            .as_ref()
            .is_some_and(|sampler| sampler.engine_id() == engine_id);
        if !current {
            trace!(engine = %engine_id, "Discarding tick from stale sampler");
            return;
        }

        self.progress.position_sec = reading.position_ms as f64 / 1000.0;
        if reading.duration_ms > 0 {
            self.progress.duration_sec = reading.duration_ms as f64 / 1000.0;
        }

        self.publish();
        self.notify_session();
        self.sinks.lifecycle.update();

        if let Some(track) = &self.current_track {
            let event = PlaybackEvent::PositionChanged {
                track_id: track.id.clone(),
                position_ms: reading.position_ms,
                duration_ms: self.progress.duration_ms(),
            };
            self.emit(CoreEvent::Playback(event));
        }
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    fn engine_dispatch(&self) -> EventDispatch {
        let mailbox = self.mailbox.clone();
        Arc::new(move |engine_id, event| {
            let delivered = mailbox
                .upgrade()
                .is_some_and(|tx| tx.send(Message::Engine { engine_id, event }).is_ok());
            if !delivered {
                trace!(engine = %engine_id, "Coordinator gone, engine event dropped");
            }
        })
    }

    fn tick_report(&self) -> ProgressReport {
        let mailbox = self.mailbox.clone();
        Arc::new(move |engine_id, reading| {
            mailbox
                .upgrade()
                .is_some_and(|tx| tx.send(Message::Tick { engine_id, reading }).is_ok())
        })
    }

    fn publish(&self) {
        self.published.send_replace(self.snapshot());
    }

    fn notify_session(&self) {
        self.sinks.session.update(
            self.current_track.as_ref(),
            self.is_playing,
            self.progress.position_ms(),
            self.progress.duration_ms(),
        );
    }

    fn notify_widget(&self) {
        self.sinks
            .widget
            .push(self.current_track.as_ref(), self.is_playing);
    }

    fn stop_foreground(&mut self) {
        self.sinks.lifecycle.stop();
        self.foreground_active = false;
    }

    fn emit(&self, event: CoreEvent) {
        if self.events.emit(event).is_err() {
            trace!("No event subscribers");
        }
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Clamp a seek target to `[0, duration]`, or to non-negative while the
/// duration is unknown.
pub fn clamp_seek(position_sec: f64, duration_sec: f64) -> f64 {
    if position_sec.is_nan() {
        0.0
    } else if duration_sec > 0.0 {
        position_sec.clamp(0.0, duration_sec)
    } else if position_sec.is_finite() {
        position_sec.abs()
    } else {
        0.0
    }
}
