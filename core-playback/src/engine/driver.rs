//! Shared engine core over a host [`AudioBackend`].
//!
//! Both engine variants run the same load path on their own task; they only
//! differ in how a [`Track`] becomes an [`AudioSource`]:
//!
//! 1. create the backend (`spawn_blocking`, hosts may block here)
//! 2. resolve the source
//! 3. `prepare` → apply any seek/volume requested meanwhile → `Ready`
//! 4. `wait_for_completion` → `Ended` or `Error`
//!
//! Releasing aborts the driver at its next await point. A backend created
//! after release is released on the spot, so an aborted load cannot leak one.

use super::{Engine, EngineEvents, EngineId, EngineKind};
use crate::error::{PlaybackError, Result};
use crate::track::Track;
use bridge_traits::error::BridgeError;
use bridge_traits::playback::{AudioBackend, AudioBackendFactory, AudioSource, PrepareOptions};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// How an engine variant turns a track into something a backend can open.
pub trait SourceResolver: Send + Sync + 'static {
    fn kind(&self) -> EngineKind;

    /// Runs on the engine's task, never on the caller's.
    fn resolve(&self, track: &Track) -> BoxFuture<'static, Result<AudioSource>>;

    fn prepare_options(&self, autoplay: bool, volume: f32) -> PrepareOptions {
        PrepareOptions {
            play_when_ready: autoplay,
            initial_volume: volume,
            buffering: None,
        }
    }

    /// Classify a failure reported after the backend became ready.
    fn playback_failure(&self, error: BridgeError) -> PlaybackError {
        PlaybackError::Interrupted(error.to_string())
    }
}

struct BackendSlot {
    backend: Option<Arc<dyn AudioBackend>>,
    driver: Option<JoinHandle<()>>,
    released: bool,
    prepared: bool,
    pending_seek: Option<Duration>,
    volume: f32,
}

/// [`Engine`] implementation parameterised by its source resolver.
pub struct BackendEngine<S: SourceResolver> {
    resolver: Arc<S>,
    backends: Arc<dyn AudioBackendFactory>,
    events: EngineEvents,
    slot: Arc<Mutex<BackendSlot>>,
}

impl<S: SourceResolver> BackendEngine<S> {
    pub fn with_resolver(
        resolver: S,
        backends: Arc<dyn AudioBackendFactory>,
        events: EngineEvents,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            backends,
            events,
            slot: Arc::new(Mutex::new(BackendSlot {
                backend: None,
                driver: None,
                released: false,
                prepared: false,
                pending_seek: None,
                volume: 1.0,
            })),
        }
    }

    pub fn resolver(&self) -> &S {
        &self.resolver
    }

    pub fn is_prepared(&self) -> bool {
        self.slot.lock().prepared
    }

    pub fn is_released(&self) -> bool {
        self.slot.lock().released
    }

    fn prepared_backend(&self) -> Result<Arc<dyn AudioBackend>> {
        let slot = self.slot.lock();
        if slot.released {
            return Err(PlaybackError::EngineReleased);
        }
        match (&slot.backend, slot.prepared) {
            (Some(backend), true) => Ok(backend.clone()),
            _ => Err(PlaybackError::NoTrackLoaded),
        }
    }

    /// Backend for teardown calls; `None` when there is nothing to act on.
    fn live_backend(&self) -> Option<Arc<dyn AudioBackend>> {
        let slot = self.slot.lock();
        if slot.released {
            return None;
        }
        slot.backend.clone()
    }
}

impl<S: SourceResolver> Engine for BackendEngine<S> {
    fn id(&self) -> EngineId {
        self.events.engine_id()
    }

    fn kind(&self) -> EngineKind {
        self.resolver.kind()
    }

    fn load(&self, track: &Track, autoplay: bool) {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(engine = %self.id(), "Engine load requested outside a runtime");
                self.events.error(PlaybackError::NoRuntime);
                return;
            }
        };

        let mut slot = self.slot.lock();
        if slot.released {
            drop(slot);
            self.events.error(PlaybackError::EngineReleased);
            return;
        }
        if slot.driver.is_some() {
            warn!(engine = %self.id(), "Engine already loading; ignoring second load");
            return;
        }

        let options = self.resolver.prepare_options(autoplay, slot.volume);
        let source = self.resolver.resolve(track);
        let driver = drive(
            self.resolver.clone(),
            self.backends.clone(),
            self.slot.clone(),
            self.events.clone(),
            source,
            options,
        );
        slot.driver = Some(runtime.spawn(driver));
    }

    fn play(&self) -> Result<()> {
        self.prepared_backend()?.play()?;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.prepared_backend()?.pause()?;
        Ok(())
    }

    fn seek(&self, position_ms: u64) -> Result<()> {
        let target = Duration::from_millis(position_ms);
        let backend = {
            let mut slot = self.slot.lock();
            if slot.released {
                return Err(PlaybackError::EngineReleased);
            }
            if !slot.prepared {
                slot.pending_seek = Some(target);
                return Ok(());
            }
            slot.backend.clone()
        };
        match backend {
            Some(backend) => Ok(backend.seek(target)?),
            None => Err(PlaybackError::NoTrackLoaded),
        }
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        let backend = {
            let mut slot = self.slot.lock();
            if slot.released {
                return Err(PlaybackError::EngineReleased);
            }
            slot.volume = volume;
            if !slot.prepared {
                return Ok(());
            }
            slot.backend.clone()
        };
        if let Some(backend) = backend {
            backend.set_volume(volume)?;
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if let Some(backend) = self.live_backend() {
            backend.stop()?;
        }
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        if let Some(backend) = self.live_backend() {
            backend.reset()?;
        }
        Ok(())
    }

    fn release(&self) -> Result<()> {
        let (driver, backend) = {
            let mut slot = self.slot.lock();
            if slot.released {
                return Ok(());
            }
            slot.released = true;
            slot.prepared = false;
            (slot.driver.take(), slot.backend.take())
        };
        if let Some(driver) = driver {
            driver.abort();
        }
        if let Some(backend) = backend {
            backend.release()?;
        }
        debug!(engine = %self.id(), "Engine released");
        Ok(())
    }

    fn current_position_ms(&self) -> i64 {
        match self.prepared_backend() {
            Ok(backend) => backend.position_ms(),
            Err(_) => -1,
        }
    }

    fn duration_ms(&self) -> i64 {
        match self.prepared_backend() {
            Ok(backend) => backend.duration_ms(),
            Err(_) => -1,
        }
    }
}

impl<S: SourceResolver> Drop for BackendEngine<S> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(engine = %self.id(), error = %e, "Release on drop failed");
        }
    }
}

#[instrument(skip_all, fields(engine = %events.engine_id(), kind = %resolver.kind()))]
async fn drive<S: SourceResolver>(
    resolver: Arc<S>,
    backends: Arc<dyn AudioBackendFactory>,
    slot: Arc<Mutex<BackendSlot>>,
    events: EngineEvents,
    source: BoxFuture<'static, Result<AudioSource>>,
    options: PrepareOptions,
) {
    let backend_kind = resolver.kind().backend_kind();
    let creation_slot = slot.clone();
    let created = tokio::task::spawn_blocking(move || -> Result<Option<Arc<dyn AudioBackend>>> {
        let backend = backends
            .create(backend_kind)
            .map_err(|e| PlaybackError::BackendUnavailable(e.to_string()))?;
        let mut guard = creation_slot.lock();
        if guard.released {
            drop(guard);
            if let Err(e) = backend.release() {
                warn!(error = %e, "Releasing late backend failed");
            }
            return Ok(None);
        }
        guard.backend = Some(backend.clone());
        Ok(Some(backend))
    })
    .await;

    let backend = match created {
        Ok(Ok(Some(backend))) => backend,
        Ok(Ok(None)) => return,
        Ok(Err(e)) => {
            events.error(e);
            return;
        }
        Err(join) => {
            if !join.is_cancelled() {
                events.error(PlaybackError::Internal(format!(
                    "backend creation panicked: {join}"
                )));
            }
            return;
        }
    };

    let source = match source.await {
        Ok(source) => source,
        Err(e) => {
            warn!(error = %e, "Source resolution failed");
            events.error(e);
            return;
        }
    };

    debug!(source = ?source, "Preparing backend");
    let duration = match backend.prepare(source, options).await {
        Ok(duration) => duration,
        Err(e) => {
            warn!(error = %e, "Backend prepare failed");
            events.error(PlaybackError::LoadFailed(e.to_string()));
            return;
        }
    };

    let (pending_seek, volume) = {
        let mut guard = slot.lock();
        if guard.released {
            return;
        }
        guard.prepared = true;
        (guard.pending_seek.take(), guard.volume)
    };
    if let Some(target) = pending_seek {
        if let Err(e) = backend.seek(target) {
            warn!(error = %e, "Deferred seek failed");
        }
    }
    if volume != options.initial_volume {
        if let Err(e) = backend.set_volume(volume) {
            warn!(error = %e, "Deferred volume change failed");
        }
    }

    info!(duration_ms = ?duration.map(|d| d.as_millis()), "Engine ready");
    events.ready(duration);

    match backend.wait_for_completion().await {
        Ok(()) => {
            debug!("Backend reached end of media");
            events.ended();
        }
        Err(e) => {
            warn!(error = %e, "Playback failed after ready");
            events.error(resolver.playback_failure(e));
        }
    }
}
