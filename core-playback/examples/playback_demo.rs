//! # Playback Coordinator Example
//!
//! Drives a two-track queue through a simulated audio backend and prints the
//! published state as it changes.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::playback::{
    AudioBackend, AudioBackendFactory, AudioSource, BackendKind, PrepareOptions,
};
use core_playback::{
    spawn, BackendEngineFactory, PlaybackConfig, PlaybackPhase, SharedCacheProvider, Sinks, Track,
};
use core_runtime::events::EventBus;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

const TRACK_LENGTH: Duration = Duration::from_secs(2);

// ============================================================================
// Simulated backend: a wall clock that runs while "playing"
// ============================================================================

#[derive(Default)]
struct Clock {
    played: Duration,
    since: Option<Instant>,
}

impl Clock {
    fn position(&self) -> Duration {
        let running = self.since.map(|s| s.elapsed()).unwrap_or_default();
        (self.played + running).min(TRACK_LENGTH)
    }
}

#[derive(Default)]
struct SimulatedBackend {
    clock: Mutex<Clock>,
}

#[async_trait]
impl AudioBackend for SimulatedBackend {
    async fn prepare(
        &self,
        source: AudioSource,
        options: PrepareOptions,
    ) -> BridgeResult<Option<Duration>> {
        println!("  backend: prepare {:?}", source);
        if options.play_when_ready {
            self.play()?;
        }
        Ok(Some(TRACK_LENGTH))
    }

    async fn wait_for_completion(&self) -> BridgeResult<()> {
        while self.clock.lock().position() < TRACK_LENGTH {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok(())
    }

    fn play(&self) -> BridgeResult<()> {
        let mut clock = self.clock.lock();
        if clock.since.is_none() {
            clock.since = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&self) -> BridgeResult<()> {
        let mut clock = self.clock.lock();
        clock.played = clock.position();
        clock.since = None;
        Ok(())
    }

    fn seek(&self, position: Duration) -> BridgeResult<()> {
        let mut clock = self.clock.lock();
        clock.played = position.min(TRACK_LENGTH);
        if clock.since.is_some() {
            clock.since = Some(Instant::now());
        }
        Ok(())
    }

    fn set_volume(&self, _volume: f32) -> BridgeResult<()> {
        Ok(())
    }

    fn stop(&self) -> BridgeResult<()> {
        self.pause()
    }

    fn reset(&self) -> BridgeResult<()> {
        *self.clock.lock() = Clock::default();
        Ok(())
    }

    fn release(&self) -> BridgeResult<()> {
        Ok(())
    }

    fn position_ms(&self) -> i64 {
        self.clock.lock().position().as_millis() as i64
    }

    fn duration_ms(&self) -> i64 {
        TRACK_LENGTH.as_millis() as i64
    }
}

struct SimulatedBackends;

impl AudioBackendFactory for SimulatedBackends {
    fn create(&self, kind: BackendKind) -> BridgeResult<Arc<dyn AudioBackend>> {
        println!("  backend: create {:?}", kind);
        Ok(Arc::new(SimulatedBackend::default()))
    }
}

struct OfflineHttp;

#[async_trait]
impl HttpClient for OfflineHttp {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        Err(BridgeError::NotAvailable("offline demo".to_string()))
    }
}

#[tokio::main]
async fn main() -> core_playback::Result<()> {
    let config = PlaybackConfig::default();
    let engines = Arc::new(BackendEngineFactory::new(
        Arc::new(SimulatedBackends),
        Arc::new(OfflineHttp),
        Arc::new(SharedCacheProvider::new(config.cache.clone())),
        config.streaming.clone(),
    ));
    let (playback, task) = spawn(config, engines, Sinks::default(), EventBus::new(64))?;

    let mut state = playback.subscribe();
    let printer = tokio::spawn(async move {
        let mut last = None;
        while state.changed().await.is_ok() {
            let snapshot = state.borrow_and_update().clone();
            let key = (snapshot.phase, snapshot.current_index);
            if last != Some(key) {
                println!(
                    "state: {:?} index={:?} track={:?}",
                    snapshot.phase,
                    snapshot.current_index,
                    snapshot.current_track.as_ref().map(|t| t.title.as_str()),
                );
                last = Some(key);
            }
            if snapshot.phase == PlaybackPhase::Ended {
                break;
            }
        }
    });

    playback.play_queue(
        vec![
            Track::new("t1", "/music/first.flac").with_title("First"),
            Track::new("t2", "/music/second.flac").with_title("Second"),
        ],
        0,
    );

    tokio::time::sleep(Duration::from_millis(700)).await;
    println!("-- pause");
    playback.toggle_play_pause();
    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("-- resume");
    playback.toggle_play_pause();

    let _ = printer.await;
    let snapshot = playback.snapshot();
    println!(
        "final position: {:.1} / {:.1} s",
        snapshot.progress.position_sec, snapshot.progress.duration_sec
    );

    playback.shutdown();
    let _ = task.await;
    Ok(())
}
