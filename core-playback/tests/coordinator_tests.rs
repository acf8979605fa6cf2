use bridge_traits::error::BridgeError;
use core_playback::engine::{Engine, EngineEvents, EngineFactory, EngineId, EngineKind};
use core_playback::sinks::{ForegroundLifecycleSink, MediaSessionSink, Sinks, WidgetSink};
use core_playback::{
    spawn, Mailbox, Message, PlaybackConfig, PlaybackCoordinator, PlaybackError, PlaybackPhase,
    Result, Track,
};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, QueueEvent};
use mockall::mock;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

// ============================================================================
// Fake engines
// ============================================================================

#[derive(Default)]
struct Knobs {
    fail_play: AtomicBool,
    fail_seek: AtomicBool,
    fail_stop: AtomicBool,
    position_ms: AtomicI64,
    live: AtomicUsize,
    peak: AtomicUsize,
}

struct FakeEngine {
    id: EngineId,
    kind: EngineKind,
    knobs: Arc<Knobs>,
    loaded: Mutex<Option<(String, bool)>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeEngine {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

impl Engine for FakeEngine {
    fn id(&self) -> EngineId {
        self.id
    }

    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn load(&self, track: &Track, autoplay: bool) {
        *self.loaded.lock() = Some((track.uri.clone(), autoplay));
    }

    fn play(&self) -> Result<()> {
        if self.knobs.fail_play.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("audio focus denied".into()).into());
        }
        self.record("play");
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.record("pause");
        Ok(())
    }

    fn seek(&self, position_ms: u64) -> Result<()> {
        if self.knobs.fail_seek.load(Ordering::SeqCst) {
            return Err(PlaybackError::NoTrackLoaded);
        }
        self.record(format!("seek:{position_ms}"));
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        self.record(format!("volume:{volume}"));
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.record("stop");
        if self.knobs.fail_stop.load(Ordering::SeqCst) {
            return Err(PlaybackError::Internal("stop exploded".into()));
        }
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        self.record("reset");
        Ok(())
    }

    fn release(&self) -> Result<()> {
        self.record("release");
        Ok(())
    }

    fn current_position_ms(&self) -> i64 {
        self.knobs.position_ms.load(Ordering::SeqCst)
    }

    fn duration_ms(&self) -> i64 {
        -1
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.knobs.live.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Created {
    engine: Weak<FakeEngine>,
    events: EngineEvents,
    calls: Arc<Mutex<Vec<String>>>,
}

#[derive(Default)]
struct FakeFactory {
    knobs: Arc<Knobs>,
    created: Mutex<Vec<Created>>,
}

impl FakeFactory {
    fn count(&self) -> usize {
        self.created.lock().len()
    }

    fn events(&self, n: usize) -> EngineEvents {
        self.created.lock()[n].events.clone()
    }

    fn calls(&self, n: usize) -> Vec<String> {
        self.created.lock()[n].calls.lock().clone()
    }

    fn loaded(&self, n: usize) -> Option<(String, bool)> {
        let engine = self.created.lock()[n].engine.upgrade()?;
        let loaded = engine.loaded.lock().clone();
        loaded
    }

    fn live(&self) -> usize {
        self.knobs.live.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.knobs.peak.load(Ordering::SeqCst)
    }
}

impl EngineFactory for FakeFactory {
    fn create(&self, kind: EngineKind, events: EngineEvents) -> Arc<dyn Engine> {
        let live = self.knobs.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.knobs.peak.fetch_max(live, Ordering::SeqCst);

        let calls = Arc::new(Mutex::new(Vec::new()));
        let engine = Arc::new(FakeEngine {
            id: events.engine_id(),
            kind,
            knobs: self.knobs.clone(),
            loaded: Mutex::new(None),
            calls: calls.clone(),
        });
        self.created.lock().push(Created {
            engine: Arc::downgrade(&engine),
            events,
            calls,
        });
        engine
    }
}

// ============================================================================
// Sink doubles
// ============================================================================

#[derive(Default)]
struct SessionRecorder {
    updates: Mutex<Vec<(Option<String>, bool, u64, u64)>>,
}

impl SessionRecorder {
    fn last(&self) -> Option<(Option<String>, bool, u64, u64)> {
        self.updates.lock().last().cloned()
    }
}

impl MediaSessionSink for SessionRecorder {
    fn update(&self, track: Option<&Track>, is_playing: bool, position_ms: u64, duration_ms: u64) {
        self.updates.lock().push((
            track.map(|t| t.title.clone()),
            is_playing,
            position_ms,
            duration_ms,
        ));
    }
}

#[derive(Default)]
struct WidgetRecorder {
    pushes: Mutex<Vec<(Option<String>, bool)>>,
}

impl WidgetRecorder {
    fn last(&self) -> Option<(Option<String>, bool)> {
        self.pushes.lock().last().cloned()
    }
}

impl WidgetSink for WidgetRecorder {
    fn push(&self, track: Option<&Track>, is_playing: bool) {
        self.pushes.lock().push((track.map(|t| t.id.clone()), is_playing));
    }
}

#[derive(Default)]
struct LifecycleRecorder {
    starts: AtomicUsize,
    updates: AtomicUsize,
    stops: AtomicUsize,
}

impl ForegroundLifecycleSink for LifecycleRecorder {
    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn update(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

mock! {
    Lifecycle {}

    impl ForegroundLifecycleSink for Lifecycle {
        fn start(&self);
        fn update(&self);
        fn stop(&self);
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    coordinator: PlaybackCoordinator,
    inbox: mpsc::UnboundedReceiver<Message>,
    _mailbox: Mailbox,
    factory: Arc<FakeFactory>,
    session: Arc<SessionRecorder>,
    widget: Arc<WidgetRecorder>,
    lifecycle: Arc<LifecycleRecorder>,
    events: broadcast::Receiver<CoreEvent>,
}

impl Harness {
    fn new() -> Self {
        let lifecycle = Arc::new(LifecycleRecorder::default());
        Self::build(lifecycle.clone(), lifecycle)
    }

    fn with_lifecycle(sink: Arc<dyn ForegroundLifecycleSink>) -> Self {
        Self::build(sink, Arc::new(LifecycleRecorder::default()))
    }

    fn build(sink: Arc<dyn ForegroundLifecycleSink>, lifecycle: Arc<LifecycleRecorder>) -> Self {
        let factory = Arc::new(FakeFactory::default());
        let session = Arc::new(SessionRecorder::default());
        let widget = Arc::new(WidgetRecorder::default());
        let sinks = Sinks::new()
            .with_session(session.clone())
            .with_widget(widget.clone())
            .with_lifecycle(sink);
        let bus = EventBus::new(256);
        let events = bus.subscribe();
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let coordinator = PlaybackCoordinator::new(
            PlaybackConfig::default(),
            factory.clone(),
            sinks,
            bus,
            &mailbox,
        );

        Self {
            coordinator,
            inbox,
            _mailbox: mailbox,
            factory,
            session,
            widget,
            lifecycle,
            events,
        }
    }

    /// Deliver everything queued by engines and samplers.
    fn pump(&mut self) {
        while let Ok(message) = self.inbox.try_recv() {
            self.coordinator.handle(message);
        }
        self.assert_single_flight();
    }

    fn ready(&mut self, n: usize, duration_sec: u64) {
        self.factory
            .events(n)
            .ready(Some(Duration::from_secs(duration_sec)));
        self.pump();
    }

    fn ended(&mut self, n: usize) {
        self.factory.events(n).ended();
        self.pump();
    }

    fn fail(&mut self, n: usize) {
        self.factory
            .events(n)
            .error(PlaybackError::LoadFailed("404".into()));
        self.pump();
    }

    fn assert_single_flight(&self) {
        let (engines, samplers) = self.coordinator.live_resources();
        assert!(engines <= 1);
        assert!(samplers <= 1);
        assert!(samplers <= engines, "sampler alive without an engine");
        assert!(self.factory.live() <= 1);
        assert!(self.factory.peak() <= 1);
    }

    fn drain_events(&mut self) -> Vec<CoreEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

fn track(id: &str) -> Track {
    Track::new(id, format!("/music/{id}.flac")).with_title(format!("Title {id}"))
}

fn current_id(h: &Harness) -> Option<String> {
    h.coordinator.snapshot().current_track.map(|t| t.id)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_scenario_a_natural_end_auto_advances() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 0);
    h.pump();

    assert_eq!(current_id(&h).as_deref(), Some("t1"));
    assert_eq!(h.coordinator.phase(), PlaybackPhase::Loading);
    assert_eq!(h.factory.loaded(0), Some(("/music/t1.flac".into(), true)));

    h.ready(0, 180);
    let snapshot = h.coordinator.snapshot();
    assert!(snapshot.is_playing);
    assert_eq!(snapshot.phase, PlaybackPhase::Playing);
    assert_eq!(snapshot.progress.duration_sec, 180.0);
    assert_eq!(h.coordinator.live_resources(), (1, 1));

    h.ended(0);
    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.current_index, Some(1));
    assert_eq!(current_id(&h).as_deref(), Some("t2"));
    assert_eq!(snapshot.phase, PlaybackPhase::Loading);
    assert_eq!(h.factory.count(), 2);
    assert_eq!(h.factory.calls(0), vec!["volume:1", "play", "stop", "reset", "release"]);

    h.ready(1, 200);
    let snapshot = h.coordinator.snapshot();
    assert!(snapshot.is_playing);
    assert_eq!(snapshot.progress.duration_sec, 200.0);
    assert_eq!(h.factory.live(), 1);

    let events = h.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::Completed { track_id }) if track_id == "t1"
    )));
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_load_failure_is_terminal() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 0);
    h.pump();
    h.fail(0);

    let snapshot = h.coordinator.snapshot();
    assert!(snapshot.current_track.is_none());
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.phase, PlaybackPhase::Failed);
    assert_eq!(snapshot.progress.position_sec, 0.0);
    assert_eq!(h.coordinator.live_resources(), (0, 0));
    assert_eq!(h.factory.count(), 1, "no auto-advance after failure");
    assert_eq!(h.factory.live(), 0);

    assert_eq!(h.session.last(), Some((None, false, 0, 0)));
    assert_eq!(h.widget.last(), Some((None, false)));
    assert_eq!(h.lifecycle.stops.load(Ordering::SeqCst), 1);

    let events = h.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::Error { recoverable: false, .. })
    )));
}

#[tokio::test(start_paused = true)]
async fn test_scenario_c_play_track_finds_its_index() {
    let mut h = Harness::new();
    let all = vec![track("t1"), track("t2"), track("t3")];
    h.coordinator.play_track(track("t3"), all);
    h.pump();

    let snapshot = h.coordinator.snapshot();
    let ids: Vec<_> = snapshot.queue.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
    assert_eq!(snapshot.current_index, Some(2));
    assert_eq!(snapshot.phase, PlaybackPhase::Loading);
    assert_eq!(h.factory.loaded(0), Some(("/music/t3.flac".into(), true)));
}

#[tokio::test(start_paused = true)]
async fn test_scenario_d_seek_is_clamped_to_duration() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.ready(0, 200);

    h.coordinator.seek_to(-5.0);
    assert_eq!(h.coordinator.snapshot().progress.position_sec, 0.0);

    h.coordinator.seek_to(250.0);
    assert_eq!(h.coordinator.snapshot().progress.position_sec, 200.0);

    let calls = h.factory.calls(0);
    assert!(calls.ends_with(&["seek:0".to_string(), "seek:200000".to_string()]));
}

#[tokio::test(start_paused = true)]
async fn test_scenario_e_metadata_patch_does_not_touch_playback() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 0);
    h.pump();
    h.ready(0, 180);
    h.coordinator.seek_to(42.0);

    let patched = track("t1").with_title("Remastered");
    h.coordinator.update_track(patched);

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.current_track.unwrap().title, "Remastered");
    assert_eq!(snapshot.queue[0].title, "Remastered");
    assert_eq!(snapshot.queue[1].title, "Title t2");
    assert!(snapshot.is_playing);
    assert_eq!(snapshot.progress.position_sec, 42.0);
    assert_eq!(h.factory.count(), 1);
    assert_eq!(
        h.session.last(),
        Some((Some("Remastered".into()), true, 42_000, 180_000))
    );
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_play_queue_filters_blank_locators_and_clamps_index() {
    let mut h = Harness::new();
    let tracks = vec![track("t1"), Track::new("blank", "  "), track("t2")];
    h.coordinator.play_queue(tracks, 9);
    h.pump();

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.queue.len(), 2);
    assert_eq!(snapshot.current_index, Some(1));
    assert_eq!(current_id(&h).as_deref(), Some("t2"));
}

#[tokio::test(start_paused = true)]
async fn test_queue_without_playable_tracks_stops() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.ready(0, 100);

    h.coordinator
        .play_queue(vec![Track::new("a", ""), Track::new("b", " ")], 0);
    h.pump();

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.phase, PlaybackPhase::Idle);
    assert!(snapshot.current_track.is_none());
    assert!(snapshot.queue.is_empty());
    assert_eq!(h.coordinator.live_resources(), (0, 0));
    assert_eq!(h.factory.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_play_track_outside_list_plays_alone() {
    let mut h = Harness::new();
    h.coordinator
        .play_track(track("solo"), vec![track("t1"), track("t2")]);
    h.pump();

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.queue.len(), 1);
    assert_eq!(snapshot.current_index, Some(0));
    assert_eq!(current_id(&h).as_deref(), Some("solo"));
}

#[tokio::test(start_paused = true)]
async fn test_seek_publishes_prediction_before_confirmation() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.ready(0, 300);

    for p in [0.0, 12.5, 150.0, 300.0] {
        h.coordinator.seek_to(p);
        assert_eq!(h.coordinator.snapshot().progress.position_sec, p);
        assert_eq!(h.coordinator.subscribe().borrow().progress.position_sec, p);
    }
}

#[tokio::test(start_paused = true)]
async fn test_seek_before_ready_uses_magnitude() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();

    h.coordinator.seek_to(-7.0);
    assert_eq!(h.coordinator.snapshot().progress.position_sec, 7.0);
    assert!(h.factory.calls(0).contains(&"seek:7000".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_seek_without_track_is_ignored() {
    let mut h = Harness::new();
    h.coordinator.seek_to(10.0);
    assert_eq!(h.coordinator.snapshot().progress.position_sec, 0.0);
    assert!(h.drain_events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_seek_failure_degrades_is_playing() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.ready(0, 100);

    h.factory.knobs.fail_seek.store(true, Ordering::SeqCst);
    h.coordinator.seek_to(30.0);

    let snapshot = h.coordinator.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.progress.position_sec, 30.0);
    assert_eq!(h.coordinator.live_resources().0, 1);
}

#[tokio::test(start_paused = true)]
async fn test_skip_previous_restarts_at_threshold() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 1);
    h.pump();
    h.ready(0, 100);

    h.coordinator.seek_to(3.0);
    h.coordinator.skip_previous();
    h.pump();

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.current_index, Some(1));
    assert_eq!(snapshot.progress.position_sec, 0.0);
    assert_eq!(h.factory.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_skip_previous_steps_back_below_threshold() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 1);
    h.pump();
    h.ready(0, 100);

    h.coordinator.seek_to(2.9);
    h.coordinator.skip_previous();
    h.pump();

    assert_eq!(h.coordinator.snapshot().current_index, Some(0));
    assert_eq!(current_id(&h).as_deref(), Some("t1"));
    assert_eq!(h.factory.count(), 2);
    assert_eq!(h.factory.live(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_skips_are_noops_at_queue_bounds() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 0);
    h.pump();

    h.coordinator.skip_previous();
    assert_eq!(h.coordinator.snapshot().current_index, Some(0));

    h.coordinator.skip_next();
    h.pump();
    assert_eq!(h.coordinator.snapshot().current_index, Some(1));

    h.coordinator.skip_next();
    h.pump();
    assert_eq!(h.coordinator.snapshot().current_index, Some(1));
    assert_eq!(h.factory.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_twice_restores_is_playing() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.ready(0, 100);
    assert!(h.coordinator.snapshot().is_playing);

    h.coordinator.toggle_play_pause();
    assert!(!h.coordinator.snapshot().is_playing);
    assert_eq!(h.coordinator.phase(), PlaybackPhase::Paused);

    h.coordinator.toggle_play_pause();
    assert!(h.coordinator.snapshot().is_playing);
    assert_eq!(h.coordinator.phase(), PlaybackPhase::Playing);

    assert!(h.factory.calls(0).ends_with(&["pause".to_string(), "play".to_string()]));
    assert_eq!(h.lifecycle.updates.load(Ordering::SeqCst), 2);

    let events = h.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Playback(PlaybackEvent::Resumed { .. }))));
}

#[tokio::test(start_paused = true)]
async fn test_toggle_failure_keeps_engine_and_stops_playing() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.ready(0, 100);
    h.coordinator.toggle_play_pause();

    h.factory.knobs.fail_play.store(true, Ordering::SeqCst);
    h.coordinator.toggle_play_pause();

    let snapshot = h.coordinator.snapshot();
    assert!(!snapshot.is_playing);
    assert!(snapshot.current_track.is_some());
    assert_eq!(h.coordinator.live_resources(), (1, 1));

    h.factory.knobs.fail_play.store(false, Ordering::SeqCst);
    h.coordinator.toggle_play_pause();
    assert!(h.coordinator.snapshot().is_playing);
}

#[tokio::test(start_paused = true)]
async fn test_play_failure_on_ready_keeps_engine() {
    let mut h = Harness::new();
    h.factory.knobs.fail_play.store(true, Ordering::SeqCst);
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.ready(0, 100);

    let snapshot = h.coordinator.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.phase, PlaybackPhase::Ready);
    assert_eq!(h.coordinator.live_resources(), (1, 1));
    assert_eq!(h.lifecycle.starts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_without_engine_is_noop() {
    let mut h = Harness::new();
    h.coordinator.toggle_play_pause();
    h.pump();

    assert_eq!(h.coordinator.phase(), PlaybackPhase::Idle);
    assert_eq!(h.factory.count(), 0);
    assert_eq!(h.lifecycle.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_while_loading_cancels_autoplay() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.coordinator.toggle_play_pause();
    assert_eq!(h.lifecycle.updates.load(Ordering::SeqCst), 1);
    h.ready(0, 100);

    let snapshot = h.coordinator.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.phase, PlaybackPhase::Ready);
    let calls = h.factory.calls(0);
    assert!(!calls.contains(&"play".to_string()));
    assert!(calls.contains(&"pause".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_toggle_while_loading_twice_keeps_autoplay() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.coordinator.toggle_play_pause();
    h.coordinator.toggle_play_pause();
    h.ready(0, 100);

    assert!(h.coordinator.snapshot().is_playing);
    assert_eq!(h.lifecycle.updates.load(Ordering::SeqCst), 2);
    assert!(!h.factory.calls(0).contains(&"pause".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_replaying_paused_entry_resumes_instead_of_reloading() {
    let mut h = Harness::new();
    let queue = vec![track("t1"), track("t2")];
    h.coordinator.play_queue(queue.clone(), 0);
    h.pump();
    h.ready(0, 100);
    h.coordinator.toggle_play_pause();

    h.coordinator.play_queue(queue, 0);
    h.pump();

    assert!(h.coordinator.snapshot().is_playing);
    assert_eq!(h.factory.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_same_id_at_other_index_reloads() {
    let mut h = Harness::new();
    let queue = vec![track("t1"), track("t1")];
    h.coordinator.play_queue(queue.clone(), 0);
    h.pump();
    h.ready(0, 100);
    h.coordinator.toggle_play_pause();

    h.coordinator.play_queue(queue, 1);
    h.pump();

    assert_eq!(h.factory.count(), 2);
    assert_eq!(h.coordinator.snapshot().current_index, Some(1));
}

// ============================================================================
// Sampling, events, teardown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_sampler_ticks_drive_progress_and_sinks() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.ready(0, 180);
    h.factory.knobs.position_ms.store(1_500, Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(260)).await;
    h.pump();

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.progress.position_sec, 1.5);
    assert_eq!(snapshot.progress.duration_sec, 180.0);
    assert_eq!(h.lifecycle.updates.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.session.last(),
        Some((Some("Title t1".into()), true, 1_500, 180_000))
    );

    h.factory.knobs.position_ms.store(-1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(250)).await;
    h.pump();
    assert_eq!(h.coordinator.snapshot().progress.position_sec, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_seek_prediction_is_overwritten_by_next_tick() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.ready(0, 180);

    h.factory.knobs.position_ms.store(60_250, Ordering::SeqCst);
    h.coordinator.seek_to(60.0);
    assert_eq!(h.coordinator.snapshot().progress.position_sec, 60.0);

    tokio::time::sleep(Duration::from_millis(260)).await;
    h.pump();
    assert_eq!(h.coordinator.snapshot().progress.position_sec, 60.25);
}

#[tokio::test(start_paused = true)]
async fn test_events_from_replaced_engine_are_ignored() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.coordinator.play_queue(vec![track("t2")], 0);
    h.pump();

    h.ready(0, 100);
    assert_eq!(h.coordinator.phase(), PlaybackPhase::Loading);
    h.fail(0);
    assert_eq!(current_id(&h).as_deref(), Some("t2"));

    h.ready(1, 100);
    h.ready(1, 100);
    assert_eq!(h.coordinator.phase(), PlaybackPhase::Playing);
    assert_eq!(h.factory.calls(1).iter().filter(|c| *c == "play").count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_tears_down_and_clears_state() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 0);
    h.pump();
    h.ready(0, 100);
    h.coordinator.seek_to(20.0);

    h.coordinator.stop();
    h.pump();

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.phase, PlaybackPhase::Idle);
    assert!(snapshot.queue.is_empty());
    assert!(snapshot.current_index.is_none());
    assert!(snapshot.current_track.is_none());
    assert_eq!(snapshot.progress.position_sec, 0.0);
    assert_eq!(snapshot.progress.duration_sec, 0.0);
    assert_eq!(h.coordinator.live_resources(), (0, 0));
    assert_eq!(h.factory.live(), 0);

    assert!(h.factory.calls(0).ends_with(&[
        "stop".to_string(),
        "reset".to_string(),
        "release".to_string()
    ]));
    assert_eq!(h.session.last(), Some((None, false, 0, 0)));
    assert_eq!(h.lifecycle.stops.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    h.pump();
    assert_eq!(h.coordinator.snapshot().progress.position_sec, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_failing_teardown_step_does_not_block_the_rest() {
    let mut h = Harness::new();
    h.factory.knobs.fail_stop.store(true, Ordering::SeqCst);
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 0);
    h.pump();
    h.ready(0, 100);

    h.coordinator.skip_next();
    h.pump();

    assert!(h.factory.calls(0).ends_with(&[
        "stop".to_string(),
        "reset".to_string(),
        "release".to_string()
    ]));
    assert_eq!(current_id(&h).as_deref(), Some("t2"));
}

#[tokio::test(start_paused = true)]
async fn test_queue_end_keeps_engine_for_replay() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1")], 0);
    h.pump();
    h.ready(0, 100);
    h.ended(0);

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.phase, PlaybackPhase::Ended);
    assert!(!snapshot.is_playing);
    assert_eq!(current_id(&h).as_deref(), Some("t1"));
    assert_eq!(h.coordinator.live_resources(), (1, 0));
    assert_eq!(h.lifecycle.stops.load(Ordering::SeqCst), 1);

    let events = h.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Queue(QueueEvent::Finished { length: 1 }))));

    h.coordinator.toggle_play_pause();
    h.pump();
    assert_eq!(h.factory.count(), 2);
    assert_eq!(h.coordinator.phase(), PlaybackPhase::Loading);
    assert_eq!(h.lifecycle.updates.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_engine_error_after_ready_is_terminal() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 0);
    h.pump();
    h.ready(0, 100);
    h.factory.knobs.position_ms.store(500, Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(600)).await;
    h.pump();
    assert!(h.coordinator.snapshot().is_playing);
    assert_eq!(h.coordinator.live_resources(), (1, 1));

    h.factory
        .events(0)
        .error(PlaybackError::Interrupted("connection reset".into()));
    h.pump();

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.phase, PlaybackPhase::Failed);
    assert!(snapshot.current_track.is_none());
    assert!(!snapshot.is_playing);
    assert_eq!(h.coordinator.live_resources(), (0, 0));
    assert_eq!(h.factory.count(), 1);
    assert_eq!(h.factory.live(), 0);
    assert!(h.factory.calls(0).ends_with(&[
        "stop".to_string(),
        "reset".to_string(),
        "release".to_string()
    ]));
}

#[tokio::test(start_paused = true)]
async fn test_volume_is_clamped_and_carried_to_next_engine() {
    let mut h = Harness::new();
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 0);
    h.pump();

    h.coordinator.set_volume(1.7);
    assert_eq!(h.coordinator.snapshot().volume, 1.0);
    h.coordinator.set_volume(0.5);

    h.coordinator.skip_next();
    h.pump();
    assert_eq!(h.factory.calls(1).first().map(String::as_str), Some("volume:0.5"));

    h.coordinator.set_volume(-3.0);
    assert_eq!(h.coordinator.snapshot().volume, 0.0);

    let events = h.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Playback(PlaybackEvent::VolumeChanged { percent: 50 }))));
}

#[tokio::test(start_paused = true)]
async fn test_foreground_starts_once_across_auto_advance() {
    let mut lifecycle = MockLifecycle::new();
    lifecycle.expect_start().times(1).return_const(());
    lifecycle.expect_update().return_const(());
    lifecycle.expect_stop().times(1).return_const(());

    let mut h = Harness::with_lifecycle(Arc::new(lifecycle));
    h.coordinator.play_queue(vec![track("t1"), track("t2")], 0);
    h.pump();
    h.ready(0, 100);
    h.ended(0);
    h.ready(1, 100);
    h.coordinator.toggle_play_pause();
    h.coordinator.toggle_play_pause();
    h.ended(1);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_coordinator_serializes_handle_calls() {
    let factory = Arc::new(FakeFactory::default());
    let bus = EventBus::new(64);
    let (playback, task) = spawn(
        PlaybackConfig::default(),
        factory.clone(),
        Sinks::default(),
        bus,
    )
    .unwrap();

    playback.play_queue(vec![track("t1"), track("t2")], 0);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(factory.count(), 1);
    assert_eq!(playback.snapshot().phase, PlaybackPhase::Loading);

    factory.events(0).ready(Some(Duration::from_secs(90)));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(playback.snapshot().is_playing);

    let mut state = playback.subscribe();
    state.borrow_and_update();
    playback.seek_to(30.0);
    state.changed().await.unwrap();
    assert_eq!(state.borrow().progress.position_sec, 30.0);

    playback.shutdown();
    task.await.unwrap();
    assert!(!playback.is_running());
    assert_eq!(playback.snapshot().phase, PlaybackPhase::Idle);
    assert_eq!(factory.live(), 0);

    playback.toggle_play_pause();
}

#[tokio::test(start_paused = true)]
async fn test_dropping_all_handles_stops_playback() {
    let factory = Arc::new(FakeFactory::default());
    let (playback, task) = spawn(
        PlaybackConfig::default(),
        factory.clone(),
        Sinks::default(),
        EventBus::new(16),
    )
    .unwrap();

    playback.play_queue(vec![track("t1")], 0);
    tokio::time::sleep(Duration::from_millis(10)).await;
    factory.events(0).ready(None);
    tokio::time::sleep(Duration::from_millis(10)).await;

    drop(playback);
    task.await.unwrap();
    assert_eq!(factory.live(), 0);
}

#[tokio::test]
async fn test_spawn_rejects_invalid_config() {
    let config = PlaybackConfig::default().with_sample_interval(Duration::ZERO);
    let result = spawn(
        config,
        Arc::new(FakeFactory::default()),
        Sinks::default(),
        EventBus::new(16),
    );
    assert!(matches!(result, Err(PlaybackError::InvalidConfig(_))));
}
