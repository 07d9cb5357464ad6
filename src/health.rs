//! Per-camera failure tracking, reconnect attempts, diagnostic frames.

use crate::draw;
use crate::source::{CameraId, CameraSession as _, CameraSource, Resolution};
use chrono::{DateTime, Local};
use image::{Rgb, RgbImage};
use log::{debug, info, warn};

const ERROR_BACKGROUND: Rgb<u8> = Rgb([255, 0, 0]);
const ERROR_TEXT: Rgb<u8> = Rgb([255, 255, 255]);

/// Health state of one configured camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraHealth {
    /// Camera produced a frame last time it was read.
    Healthy,
    /// Camera failed to produce a frame.
    Unavailable {
        /// Human-readable status line shown on the diagnostic frame.
        message: String,
        /// When the failure was first seen.
        since: DateTime<Local>,
    },
}

/// Tracks per-camera failure state across cycles and drives reconnects.
#[derive(Debug)]
pub struct HealthMonitor {
    states: Vec<CameraHealth>,
}

impl HealthMonitor {
    /// Create a monitor with every camera assumed healthy.
    #[must_use]
    pub fn new(camera_count: usize) -> Self {
        Self {
            states: vec![CameraHealth::Healthy; camera_count],
        }
    }

    /// Current health of the camera at position `index`.
    #[must_use]
    pub fn health(&self, index: usize) -> &CameraHealth {
        self.states.get(index).unwrap_or(&CameraHealth::Healthy)
    }

    /// Record a null read for the camera at position `index` and return the
    /// status message to show on its diagnostic frame.
    ///
    /// A camera that was healthy gets a fresh message stamped with `now`; a
    /// camera that was already down keeps its original message so the
    /// timestamp reflects when the outage began.
    pub fn mark_failed(&mut self, index: usize, name: &str, now: DateTime<Local>) -> String {
        match self.states.get(index) {
            Some(CameraHealth::Unavailable { message, .. }) => {
                debug!("camera {} ({name}) still off", index + 1);
                message.clone()
            }
            _ => {
                let message = format!(
                    "Camera {} ({name}) is OFF at {}",
                    index + 1,
                    now.format("%Y-%m-%d %H:%M:%S")
                );
                warn!("{message}");
                if let Some(state) = self.states.get_mut(index) {
                    *state = CameraHealth::Unavailable {
                        message: message.clone(),
                        since: now,
                    };
                }
                message
            }
        }
    }

    /// Record a successful read for the camera at position `index`.
    pub fn mark_healthy(&mut self, index: usize, name: &str) {
        if let Some(state) = self.states.get_mut(index) {
            if matches!(state, CameraHealth::Unavailable { .. }) {
                info!("camera {} ({name}) is ON", index + 1);
            }
            *state = CameraHealth::Healthy;
        }
    }

    /// Try to reopen a camera that produced no frame this cycle.
    ///
    /// Runs once per cycle per failed camera with no backoff. Success clears
    /// the unavailable state but does not produce a frame for this cycle;
    /// the diagnostic frame still stands in for it.
    pub fn attempt_reconnect<S: CameraSource>(
        &mut self,
        source: &mut S,
        index: usize,
        name: &str,
        camera: CameraId,
        resolution: Resolution,
    ) -> bool {
        match source.open(camera, resolution) {
            Ok(mut session) => {
                session.release();
                self.mark_healthy(index, name);
                true
            }
            Err(err) => {
                debug!("camera {} ({name}) reconnect failed: {err}", index + 1);
                false
            }
        }
    }
}

/// Render a red diagnostic frame with `message` centered in white.
#[must_use]
pub fn diagnostic_frame(message: &str, resolution: Resolution) -> RgbImage {
    let mut image = RgbImage::new(resolution.width, resolution.height);
    draw::fill(&mut image, ERROR_BACKGROUND);
    #[allow(clippy::cast_possible_wrap)]
    let y = (resolution.height.saturating_sub(draw::CHAR_HEIGHT) / 2) as i32;
    draw::draw_text_centered(&mut image, y, message, ERROR_TEXT);
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{CameraScript, SyntheticSource};

    fn noon() -> DateTime<Local> {
        Local::now()
    }

    #[test]
    fn test_first_failure_records_message() {
        let mut monitor = HealthMonitor::new(2);
        let message = monitor.mark_failed(1, "B", noon());
        assert!(message.contains("Camera 2 (B) is OFF at "));
        assert!(matches!(
            monitor.health(1),
            CameraHealth::Unavailable { .. }
        ));
        assert_eq!(monitor.health(0), &CameraHealth::Healthy);
    }

    #[test]
    fn test_repeat_failure_keeps_original_message() {
        let mut monitor = HealthMonitor::new(1);
        let first = monitor.mark_failed(0, "A", noon());
        let second = monitor.mark_failed(0, "A", noon());
        assert_eq!(first, second);
    }

    #[test]
    fn test_mark_healthy_clears_state() {
        let mut monitor = HealthMonitor::new(1);
        monitor.mark_failed(0, "A", noon());
        monitor.mark_healthy(0, "A");
        assert_eq!(monitor.health(0), &CameraHealth::Healthy);
    }

    #[test]
    fn test_reconnect_success_clears_state() {
        let mut source = SyntheticSource::new();
        let mut monitor = HealthMonitor::new(1);
        monitor.mark_failed(0, "A", noon());
        let ok = monitor.attempt_reconnect(&mut source, 0, "A", 0, Resolution::new(8, 8));
        assert!(ok);
        assert_eq!(monitor.health(0), &CameraHealth::Healthy);
        assert_eq!(source.open_count(0), 1);
    }

    #[test]
    fn test_reconnect_failure_keeps_state() {
        let mut source = SyntheticSource::new().with_camera(4, CameraScript::FailOpen);
        let mut monitor = HealthMonitor::new(1);
        monitor.mark_failed(0, "B", noon());
        let ok = monitor.attempt_reconnect(&mut source, 0, "B", 4, Resolution::new(8, 8));
        assert!(!ok);
        assert!(matches!(
            monitor.health(0),
            CameraHealth::Unavailable { .. }
        ));
    }

    #[test]
    fn test_diagnostic_frame_is_red_with_text() {
        let frame = diagnostic_frame("Camera 2 (B) is OFF", Resolution::new(320, 240));
        assert_eq!(frame.width(), 320);
        assert_eq!(frame.height(), 240);
        // Corners untouched by text stay on the error background
        assert_eq!(frame.get_pixel(0, 0).0, [255, 0, 0]);
        // Some pixels carry the message
        assert!(frame.pixels().any(|p| p.0 == [255, 255, 255]));
    }
}
