//! # Progress Sampler
//!
//! Periodic reader of the active engine's position and duration.
//!
//! A sampler holds only a weak reference to its engine and exits quietly
//! once the engine is gone or the receiver stops accepting readings.
//! Dropping a [`ProgressSampler`] is a synchronous cancel: it waits for any
//! in-progress tick to finish, and no reading is reported afterwards.

use crate::engine::{Engine, EngineId};
use crate::error::{PlaybackError, Result};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// One sanitized position sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressReading {
    pub position_ms: u64,
    pub duration_ms: u64,
}

impl ProgressReading {
    /// Negative platform readings mean "unknown" and become 0.
    pub fn from_raw(position_ms: i64, duration_ms: i64) -> Self {
        Self {
            position_ms: position_ms.max(0) as u64,
            duration_ms: duration_ms.max(0) as u64,
        }
    }
}

/// Receives readings; returning `false` ends the sampler.
pub type ProgressReport = Arc<dyn Fn(EngineId, ProgressReading) -> bool + Send + Sync>;

/// Handle to a running sampler task. Drop to cancel.
pub struct ProgressSampler {
    engine_id: EngineId,
    gate: Arc<Mutex<bool>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressSampler {
    /// Start sampling `engine` every `interval`. The first reading is taken
    /// one interval after start.
    pub fn spawn(
        engine: &Arc<dyn Engine>,
        interval: Duration,
        report: ProgressReport,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| PlaybackError::NoRuntime)?;
        if interval.is_zero() {
            return Err(PlaybackError::InvalidConfig(
                "sample interval must be greater than zero".to_string(),
            ));
        }

        let engine_id = engine.id();
        let gate = Arc::new(Mutex::new(true));
        let cancel = CancellationToken::new();
        let task = runtime.spawn(run(
            Arc::downgrade(engine),
            engine_id,
            interval,
            gate.clone(),
            cancel.clone(),
            report,
        ));

        debug!(engine = %engine_id, interval_ms = interval.as_millis() as u64, "Sampler started");
        Ok(Self {
            engine_id,
            gate,
            cancel,
            task,
        })
    }

    pub fn engine_id(&self) -> EngineId {
        self.engine_id
    }

    /// Whether the loop has exited on its own.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ProgressSampler {
    fn drop(&mut self) {
        *self.gate.lock() = false;
        self.cancel.cancel();
        self.task.abort();
        debug!(engine = %self.engine_id, "Sampler cancelled");
    }
}

async fn run(
    engine: Weak<dyn Engine>,
    engine_id: EngineId,
    period: Duration,
    gate: Arc<Mutex<bool>>,
    cancel: CancellationToken,
    report: ProgressReport,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let keep_going = {
            let open = gate.lock();
            if !*open {
                false
            } else if let Some(engine) = engine.upgrade() {
                let reading =
                    ProgressReading::from_raw(engine.current_position_ms(), engine.duration_ms());
                drop(engine);
                trace!(
                    engine = %engine_id,
                    position_ms = reading.position_ms,
                    duration_ms = reading.duration_ms,
                    "Progress tick"
                );
                report(engine_id, reading)
            } else {
                debug!(engine = %engine_id, "Engine gone, sampler exiting");
                false
            }
        };

        if !keep_going {
            break;
        }
    }
}
