//! The acquisition control loop: daylight gating, per-cycle orchestration,
//! interval-based persistence and drift-compensated sleep.

use crate::config::CaptureConfig;
use crate::health::{diagnostic_frame, HealthMonitor};
use crate::layout::{cpu_temperature, label_tile, scale_to_tile, LayoutCompositor};
use crate::source::{CameraSession as _, CameraSource, Frame, Result};
use crate::stages::FrameStage;
use crate::store::FrameStore;
use chrono::{Local, Timelike};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Fixed sleep between daylight checks while outside the capture window.
pub const OFF_WINDOW_SLEEP: Duration = Duration::from_secs(3600);

/// Cooperative cancellation flag, checked once per loop iteration.
///
/// Clone the token and call `cancel` from a signal handler or another
/// thread; the loop finishes its current cycle and returns.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop to stop after the current iteration.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// What the scheduler should do at the top of an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Inside the daylight window: run a capture cycle.
    Capture,
    /// Outside the window: sleep this long without touching any camera.
    Sleep(Duration),
}

/// Daylight gate: capture only when `hour` falls inside `[start, end]`.
#[must_use]
pub const fn gate(hour: u32, start: u32, end: u32) -> GateDecision {
    if start <= hour && hour <= end {
        GateDecision::Capture
    } else {
        GateDecision::Sleep(OFF_WINDOW_SLEEP)
    }
}

/// Sleep needed to keep the nominal period stable: interval minus the time
/// this cycle took, clamped at zero when the cycle overran.
#[must_use]
pub const fn drift_compensated_sleep(interval: Duration, cycle_cost: Duration) -> Duration {
    interval.saturating_sub(cycle_cost)
}

/// Outcome of a single capture cycle.
#[derive(Debug)]
pub struct CycleReport {
    /// Cameras that produced a real frame this cycle.
    pub frames_read: usize,
    /// Whether this cycle's frames were persisted.
    pub saved: bool,
    /// Sleep duration computed for the inter-cycle pause.
    pub sleep: Duration,
}

/// Owns the capture loop and all per-cycle state.
///
/// Single-threaded and cooperative: cameras are opened, read and released
/// sequentially inside one cycle, so camera N's frame always follows
/// camera N-1's and no handle outlives the cycle that opened it.
pub struct AcquisitionScheduler<S: CameraSource> {
    config: CaptureConfig,
    source: S,
    health: HealthMonitor,
    store: FrameStore,
    compositor: LayoutCompositor,
    stages: Vec<Box<dyn FrameStage>>,
    cancel: CancelToken,
    last_save: Option<Instant>,
}

impl<S: CameraSource> AcquisitionScheduler<S> {
    /// Build a scheduler over a validated config, a camera source and a
    /// prepared frame store.
    #[must_use]
    pub fn new(config: CaptureConfig, source: S, store: FrameStore) -> Self {
        let camera_count = config.camera_indexes.len();
        let compositor = LayoutCompositor::new(config.display_resolution());
        Self {
            config,
            source,
            health: HealthMonitor::new(camera_count),
            store,
            compositor,
            stages: Vec::new(),
            cancel: CancelToken::new(),
            last_save: None,
        }
    }

    /// Append a post-processing stage; stages run in insertion order.
    #[must_use]
    pub fn with_stage(mut self, stage: Box<dyn FrameStage>) -> Self {
        info!("enabling {} stage", stage.name());
        self.stages.push(stage);
        self
    }

    /// Token for cancelling the loop from outside.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The camera source, e.g. for inspecting a synthetic source in tests.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the camera source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Per-camera health as of the last cycle.
    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    /// Run until cancelled. Outside the daylight window the loop sleeps in
    /// fixed one-hour steps with no camera I/O.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "starting capture loop: {} cameras, {}min interval, daylight {}-{}",
            self.config.camera_indexes.len(),
            self.config.interval_minutes,
            self.config.light_start_hour,
            self.config.light_end_hour,
        );
        loop {
            if self.cancel.is_cancelled() {
                info!("cancellation requested, stopping capture loop");
                return Ok(());
            }

            let hour = Local::now().hour();
            match gate(hour, self.config.light_start_hour, self.config.light_end_hour) {
                GateDecision::Sleep(pause) => {
                    info!("outside daylight window (hour {hour}), sleeping 1 hour");
                    thread::sleep(pause);
                }
                GateDecision::Capture => {
                    let report = self.run_cycle()?;
                    debug!(
                        "cycle done: {} frames read, saved: {}",
                        report.frames_read, report.saved
                    );
                    info!("sleeping for {} seconds", report.sleep.as_secs());
                    thread::sleep(report.sleep);
                }
            }
        }
    }

    /// Execute one full capture cycle: open, read, release, diagnose,
    /// compose, persist, and compute the inter-cycle sleep.
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        let started = Instant::now();
        let now = Local::now();
        let cameras = self.config.camera_indexes.clone();
        let names = self.config.camera_names.clone();
        let capture_res = self.config.capture_resolution();

        // Open, read and release serialized per camera; handles are never
        // held across the compose/save steps.
        let mut frames: Vec<Option<Frame>> = Vec::with_capacity(cameras.len());
        for &camera in &cameras {
            let frame = match self.source.open(camera, capture_res) {
                Ok(mut session) => {
                    let result = session.read();
                    session.release();
                    match result {
                        Ok(frame) => Some(frame),
                        Err(err) => {
                            warn!("camera {camera}: read failed: {err}");
                            None
                        }
                    }
                }
                Err(err) => {
                    warn!("camera {camera}: open failed: {err}");
                    None
                }
            };
            frames.push(frame);
        }

        for frame in frames.iter_mut().flatten() {
            for stage in &self.stages {
                frame.image = stage.apply(&frame.image);
            }
        }

        // Health pass: the diagnostic message is captured before the
        // reconnect attempt, because a successful reconnect clears the
        // state but this cycle's frame is still missing.
        let mut diag_messages: Vec<Option<String>> = Vec::with_capacity(frames.len());
        for (index, ((frame, name), &camera)) in
            frames.iter().zip(&names).zip(&cameras).enumerate()
        {
            if frame.is_some() {
                self.health.mark_healthy(index, name);
                diag_messages.push(None);
            } else {
                let message = self.health.mark_failed(index, name, now);
                self.health
                    .attempt_reconnect(&mut self.source, index, name, camera, capture_res);
                diag_messages.push(Some(message));
            }
        }

        if self.config.display {
            let display = self.config.display_resolution();
            let mut tiles = Vec::with_capacity(frames.len());
            for ((frame, message), name) in frames.iter().zip(&diag_messages).zip(&names) {
                let tile = if let Some(frame) = frame {
                    let mut tile = scale_to_tile(&frame.image, display);
                    label_tile(&mut tile, name);
                    tile
                } else {
                    let message = message.as_deref().unwrap_or("camera is OFF");
                    diagnostic_frame(message, display)
                };
                tiles.push(tile);
            }
            let grid = self.compositor.compose(tiles)?;
            if let Err(err) = self.store.publish_grid(&grid) {
                warn!("failed to publish grid: {err}");
            }
        }

        let interval = self.config.interval();
        let due = self.last_save.map_or(true, |at| at.elapsed() >= interval);
        let mut saved = false;
        if due {
            info!("{}", now.format("%Y-%m-%d %H:%M:%S"));
            self.last_save = Some(Instant::now());
            for (frame, name) in frames.iter().zip(&names) {
                if let Some(frame) = frame {
                    match self.store.save(frame, name) {
                        Ok(path) => info!("saved {name} frame to {}", path.display()),
                        Err(err) => warn!("failed to save {name} frame: {err}"),
                    }
                }
            }
            info!("{}", cpu_temperature());
            saved = true;
        }

        if let Err(err) = self.store.write_marker(Local::now()) {
            warn!("failed to write marker file: {err}");
        }

        let sleep = drift_compensated_sleep(interval, started.elapsed());
        if sleep.is_zero() {
            warn!(
                "cycle took longer than the {}s interval, skipping sleep",
                interval.as_secs()
            );
        }

        Ok(CycleReport {
            frames_read: frames.iter().flatten().count(),
            saved,
            sleep,
        })
    }
}
