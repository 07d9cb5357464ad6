//! Deterministic synthetic camera source for tests and headless demos.
//!
//! Each camera identifier can be scripted to serve a test pattern or to
//! fail at open or read time, which is how the scheduler's failure and
//! reconnect paths are exercised without hardware.

use crate::source::{
    CameraId, CameraSession, CameraSource, CaptureError, Frame, Resolution, Result,
};
use chrono::Local;
use image::{Rgb, RgbImage};
use std::collections::HashMap;

/// Test pattern types for synthetic frame generation.
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// SMPTE color bars pattern.
    ColorBars,
    /// Horizontal gradient from dark to light.
    Gradient,
    /// Solid color with the given RGB values.
    Solid(u8, u8, u8),
}

/// Scripted behavior for one synthetic camera.
#[derive(Debug, Clone, Copy)]
pub enum CameraScript {
    /// Serve frames with the given pattern.
    Pattern(TestPattern),
    /// Refuse to open.
    FailOpen,
    /// Open, then fail every read.
    FailRead,
}

/// Camera source producing deterministic synthetic frames.
#[derive(Debug, Default)]
pub struct SyntheticSource {
    scripts: HashMap<CameraId, CameraScript>,
    open_counts: HashMap<CameraId, u32>,
}

impl SyntheticSource {
    /// Create a source where every camera serves color bars.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the behavior of one camera identifier.
    #[must_use]
    pub fn with_camera(mut self, camera: CameraId, script: CameraScript) -> Self {
        self.scripts.insert(camera, script);
        self
    }

    /// Change the behavior of one camera identifier in place.
    pub fn set_script(&mut self, camera: CameraId, script: CameraScript) {
        self.scripts.insert(camera, script);
    }

    /// Number of times `open` has been called for this identifier.
    #[must_use]
    pub fn open_count(&self, camera: CameraId) -> u32 {
        self.open_counts.get(&camera).copied().unwrap_or(0)
    }
}

impl CameraSource for SyntheticSource {
    type Session = SyntheticSession;

    fn open(&mut self, camera: CameraId, resolution: Resolution) -> Result<Self::Session> {
        *self.open_counts.entry(camera).or_insert(0) += 1;

        let script = self
            .scripts
            .get(&camera)
            .copied()
            .unwrap_or(CameraScript::Pattern(TestPattern::ColorBars));

        match script {
            CameraScript::FailOpen => Err(CaptureError::DeviceOpenFailed {
                camera,
                reason: "scripted open failure".to_owned(),
            }),
            CameraScript::FailRead => Ok(SyntheticSession {
                camera,
                resolution,
                pattern: None,
                released: false,
            }),
            CameraScript::Pattern(pattern) => Ok(SyntheticSession {
                camera,
                resolution,
                pattern: Some(pattern),
                released: false,
            }),
        }
    }
}

/// One open synthetic camera.
#[derive(Debug)]
pub struct SyntheticSession {
    camera: CameraId,
    resolution: Resolution,
    pattern: Option<TestPattern>,
    released: bool,
}

impl CameraSession for SyntheticSession {
    fn read(&mut self) -> Result<Frame> {
        if self.released {
            return Err(CaptureError::StreamError {
                camera: self.camera,
                reason: "session already released".to_owned(),
            });
        }
        let pattern = self.pattern.ok_or_else(|| CaptureError::StreamError {
            camera: self.camera,
            reason: "scripted read failure".to_owned(),
        })?;

        Ok(Frame {
            image: generate_pattern(self.resolution, pattern),
            camera: self.camera,
            captured_at: Local::now(),
        })
    }

    fn release(&mut self) {
        self.released = true;
    }
}

/// RGB values for the eight SMPTE color bars.
const SMPTE_COLOR_BARS: [(u8, u8, u8); 8] = [
    (235, 235, 235), // White
    (235, 235, 11),  // Yellow
    (12, 236, 237),  // Cyan
    (13, 237, 13),   // Green
    (237, 13, 237),  // Magenta
    (238, 14, 13),   // Red
    (15, 15, 239),   // Blue
    (16, 16, 16),    // Black
];

fn generate_pattern(resolution: Resolution, pattern: TestPattern) -> RgbImage {
    let (width, height) = (resolution.width, resolution.height);
    match pattern {
        TestPattern::ColorBars => {
            let bar_width = (width / 8).max(1);
            RgbImage::from_fn(width, height, |x, _y| {
                let idx = ((x / bar_width) as usize).min(7);
                let (r, g, b) = SMPTE_COLOR_BARS[idx];
                Rgb([r, g, b])
            })
        }
        TestPattern::Gradient => RgbImage::from_fn(width, height, |x, _y| {
            #[allow(clippy::cast_possible_truncation)]
            let level = ((u64::from(x) * 255) / u64::from(width.max(1))) as u8;
            Rgb([level, level, level])
        }),
        TestPattern::Solid(r, g, b) => RgbImage::from_pixel(width, height, Rgb([r, g, b])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_dimensions() {
        let mut source = SyntheticSource::new();
        let mut session = source
            .open(0, Resolution::new(64, 48))
            .expect("open should succeed");
        let frame = session.read().expect("read should succeed");
        assert_eq!(frame.resolution(), Resolution::new(64, 48));
        assert_eq!(frame.camera, 0);
    }

    #[test]
    fn test_color_bars_edges() {
        let image = generate_pattern(Resolution::new(64, 8), TestPattern::ColorBars);
        // First bar white, last bar black
        assert_eq!(image.get_pixel(0, 0).0, [235, 235, 235]);
        assert_eq!(image.get_pixel(63, 7).0, [16, 16, 16]);
    }

    #[test]
    fn test_gradient_increases() {
        let image = generate_pattern(Resolution::new(64, 8), TestPattern::Gradient);
        assert!(image.get_pixel(0, 0).0[0] < image.get_pixel(63, 0).0[0]);
    }

    #[test]
    fn test_scripted_open_failure_counts() {
        let mut source = SyntheticSource::new().with_camera(4, CameraScript::FailOpen);
        assert!(source.open(4, Resolution::new(8, 8)).is_err());
        assert!(source.open(4, Resolution::new(8, 8)).is_err());
        assert_eq!(source.open_count(4), 2);
        assert_eq!(source.open_count(0), 0);
    }

    #[test]
    fn test_scripted_read_failure() {
        let mut source = SyntheticSource::new().with_camera(1, CameraScript::FailRead);
        let mut session = source
            .open(1, Resolution::new(8, 8))
            .expect("open should succeed");
        assert!(session.read().is_err());
    }

    #[test]
    fn test_read_after_release_fails() {
        let mut source = SyntheticSource::new();
        let mut session = source
            .open(0, Resolution::new(8, 8))
            .expect("open should succeed");
        session.release();
        session.release();
        assert!(session.read().is_err());
    }
}
