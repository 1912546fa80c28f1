//! # Capture Scheduler Module
//!
//! Orchestrates the periodic capture/analysis loop: every 300 ms tick starts
//! a 100 ms recording, runs the finished clip through
//! parse → decode → analyze → match, publishes the readout, and deletes the
//! clip. A single driver task owns the whole timeline, so at most one cycle
//! is ever in flight; ticks that fire while a cycle is still running are
//! dropped, not queued.
//!
//! The scheduler's phase is published as an explicit [`SchedulerState`]
//! rather than an internal busy flag, so callers and tests observe the
//! actual transitions.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::TunerReadout;
use crate::analyze_clip;
use crate::device::{CaptureDevice, ClipStore};
use crate::tuning::TargetPitch;

/// Capture sample rate: 44.1 kHz mono 16-bit linear PCM.
pub const SAMPLE_RATE_HZ: u32 = 44_100;

/// Period of the capture tick.
pub const TICK_INTERVAL: Duration = Duration::from_millis(300);

/// Length of each recording.
pub const CAPTURE_WINDOW: Duration = Duration::from_millis(100);

/// The notice surfaced when microphone access is refused. The only
/// user-facing failure in the pipeline; everything else is logged.
pub const PERMISSION_NOTICE: &str = "Microphone permission is required to use this feature.";

/// Phase of the scheduler, published on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    /// Constructed, driver not yet configuring.
    Idle,
    /// Requesting microphone authorization and fixing the capture mode.
    Configuring,
    /// Waiting for the next tick.
    Armed,
    /// A recording is open for the capture window.
    Recording,
    /// The finished clip is being read, analyzed, and cleaned up.
    Processing,
    /// Torn down, or authorization was refused. Terminal.
    Stopped,
}

/// Owns the capture loop: the periodic tick, the recording resource, and
/// the published readout.
///
/// Lifecycle is construct → [`start`](Self::start) → [`stop`](Self::stop) →
/// drop. `stop` is idempotent and never panics, even while a recording is
/// open. Dropping without stopping signals the driver to shut down on its
/// next suspension point.
pub struct CaptureScheduler {
    target_tx: watch::Sender<Option<TargetPitch>>,
    readout_rx: watch::Receiver<TunerReadout>,
    state_rx: watch::Receiver<SchedulerState>,
    notice_rx: watch::Receiver<Option<String>>,
    shutdown_tx: watch::Sender<bool>,
    driver: Option<JoinHandle<()>>,
}

impl CaptureScheduler {
    /// Spawns the driver task and begins configuring the device.
    ///
    /// If authorization is refused the scheduler moves straight to
    /// [`SchedulerState::Stopped`] and publishes [`PERMISSION_NOTICE`].
    pub fn start(device: Arc<dyn CaptureDevice>, store: Arc<dyn ClipStore>) -> Self {
        let (target_tx, target_rx) = watch::channel(None);
        let (readout_tx, readout_rx) = watch::channel(TunerReadout::default());
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);
        let (notice_tx, notice_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = Driver {
            device,
            store,
            target_rx,
            readout_tx,
            state_tx,
            notice_tx,
        };
        let driver = tokio::spawn(run(driver, shutdown_rx));

        Self {
            target_tx,
            readout_rx,
            state_rx,
            notice_rx,
            shutdown_tx,
            driver: Some(driver),
        }
    }

    /// Selects the string to tune against. Read once per cycle at match
    /// time; `None` clears the selection.
    pub fn set_target(&self, target: Option<TargetPitch>) {
        let _ = self.target_tx.send(target);
    }

    /// Latest published readout. Overwritten each completed cycle.
    pub fn readout(&self) -> TunerReadout {
        *self.readout_rx.borrow()
    }

    /// Watch channel for the readout, for a presentation layer to await.
    pub fn subscribe_readout(&self) -> watch::Receiver<TunerReadout> {
        self.readout_rx.clone()
    }

    /// Current scheduler phase.
    pub fn state(&self) -> SchedulerState {
        *self.state_rx.borrow()
    }

    /// Watch channel for state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state_rx.clone()
    }

    /// The user-facing notice, set only when authorization is refused.
    pub fn notice(&self) -> Option<String> {
        self.notice_rx.borrow().clone()
    }

    /// Tears the scheduler down: cancels the tick, discards any in-flight
    /// recording, and waits for the driver to finish.
    pub async fn stop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
        }
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// State owned by the driver task.
struct Driver {
    device: Arc<dyn CaptureDevice>,
    store: Arc<dyn ClipStore>,
    target_rx: watch::Receiver<Option<TargetPitch>>,
    readout_tx: watch::Sender<TunerReadout>,
    state_tx: watch::Sender<SchedulerState>,
    notice_tx: watch::Sender<Option<String>>,
}

/// Whether the loop keeps ticking after a cycle.
enum Cycle {
    Continue,
    Shutdown,
}

async fn run(driver: Driver, mut shutdown_rx: watch::Receiver<bool>) {
    driver.set_state(SchedulerState::Configuring);
    if let Err(e) = driver.device.authorize().await {
        log::error!("microphone authorization failed: {e}");
        let _ = driver.notice_tx.send(Some(PERMISSION_NOTICE.to_string()));
        driver.set_state(SchedulerState::Stopped);
        return;
    }
    driver.set_state(SchedulerState::Armed);

    // Ticks live on a fixed grid anchored at arming, first tick one full
    // period in. Grid slots that pass while a cycle is in flight are
    // dropped outright, never delivered late.
    let start = tokio::time::Instant::now();
    let mut next_tick = start + TICK_INTERVAL;

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(next_tick) => {
                if let Cycle::Shutdown = driver.run_cycle(&mut shutdown_rx).await {
                    break;
                }
                let now = tokio::time::Instant::now();
                while next_tick <= now {
                    next_tick += TICK_INTERVAL;
                }
            }
            _ = shutdown_rx.changed() => break,
        }
    }
    driver.set_state(SchedulerState::Stopped);
}

impl Driver {
    fn set_state(&self, state: SchedulerState) {
        let _ = self.state_tx.send(state);
    }

    /// One capture/analysis cycle. Every failure past this point is
    /// contained here; the next tick starts fresh.
    async fn run_cycle(&self, shutdown_rx: &mut watch::Receiver<bool>) -> Cycle {
        let recording = match self.device.begin().await {
            Ok(handle) => handle,
            Err(e) => {
                // No recording ever opened; the state stays Armed and the
                // next tick retries with a fresh cycle.
                log::warn!("failed to start capture: {e}");
                return Cycle::Continue;
            }
        };
        self.set_state(SchedulerState::Recording);

        tokio::select! {
            _ = tokio::time::sleep(CAPTURE_WINDOW) => {}
            _ = shutdown_rx.changed() => {
                recording.discard().await;
                return Cycle::Shutdown;
            }
        }

        let location = match recording.stop().await {
            Ok(location) => location,
            Err(e) => {
                log::warn!("failed to finalize capture: {e}");
                self.set_state(SchedulerState::Armed);
                return Cycle::Continue;
            }
        };

        self.set_state(SchedulerState::Processing);
        match self.process_clip(&location).await {
            Ok(Some(readout)) => {
                let _ = self.readout_tx.send(readout);
            }
            Ok(None) => log::debug!("clip had no PCM payload, cycle skipped"),
            Err(e) => log::warn!("analysis cycle abandoned: {e}"),
        }

        // The clip is released on every exit path of the cycle.
        if let Err(e) = self.store.delete(&location).await {
            log::warn!("failed to delete clip {}: {e}", location.display());
        }

        self.set_state(SchedulerState::Armed);
        Cycle::Continue
    }

    async fn process_clip(
        &self,
        location: &Path,
    ) -> Result<Option<TunerReadout>, crate::error::TunerError> {
        let clip = self.store.read(location).await?;
        // One consistent snapshot of the target per cycle.
        let target = *self.target_rx.borrow();
        analyze_clip(&clip, target)
    }
}
