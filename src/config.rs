//! Capture configuration: parsing, validation, output directory setup.

use crate::source::{CameraId, CaptureError, Resolution, Result};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Validated, immutable capture configuration.
///
/// Loaded once at startup; a length mismatch between `camera_indexes` and
/// `camera_names` is fatal before any directory is created.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Ordered device identifiers to capture from.
    pub camera_indexes: Vec<CameraId>,
    /// Ordered human-readable names, parallel to `camera_indexes`.
    pub camera_names: Vec<String>,
    /// Capture and display resolutions.
    pub resolution: ResolutionConfig,
    /// Minutes between persisted snapshots.
    pub interval_minutes: u64,
    /// First hour of the daylight window (0-23, inclusive).
    pub light_start_hour: u32,
    /// Last hour of the daylight window (0-23, inclusive).
    pub light_end_hour: u32,
    /// Optional gamma correction applied to every real frame.
    #[serde(default)]
    pub gamma: Option<f32>,
    /// Whether to compose and publish the monitoring grid each cycle.
    #[serde(default)]
    pub display: bool,
}

/// Resolution settings for capture and for the display grid.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionConfig {
    /// Sensor capture width.
    pub capture_width: u32,
    /// Sensor capture height.
    pub capture_height: u32,
    /// Width of each tile in the display grid.
    pub display_width: u32,
    /// Height of each tile in the display grid.
    pub display_height: u32,
}

impl CaptureConfig {
    /// Load and validate configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|err| CaptureError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.camera_indexes.len() != self.camera_names.len() {
            return Err(CaptureError::Config(format!(
                "{} camera indexes but {} camera names",
                self.camera_indexes.len(),
                self.camera_names.len()
            )));
        }
        if self.camera_indexes.is_empty() {
            return Err(CaptureError::Config("no cameras configured".to_owned()));
        }
        for hour in [self.light_start_hour, self.light_end_hour] {
            if hour > 23 {
                return Err(CaptureError::Config(format!(
                    "daylight hour {hour} outside 0-23"
                )));
            }
        }
        if self.light_start_hour > self.light_end_hour {
            return Err(CaptureError::Config(format!(
                "daylight window starts at {} but ends at {}",
                self.light_start_hour, self.light_end_hour
            )));
        }
        if self.interval_minutes == 0 {
            return Err(CaptureError::Config(
                "interval_minutes must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Sensor capture resolution.
    #[must_use]
    pub const fn capture_resolution(&self) -> Resolution {
        Resolution::new(self.resolution.capture_width, self.resolution.capture_height)
    }

    /// Per-tile display resolution.
    #[must_use]
    pub const fn display_resolution(&self) -> Resolution {
        Resolution::new(self.resolution.display_width, self.resolution.display_height)
    }

    /// Snapshot interval as a duration.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    /// Create one output directory per camera name under `root`.
    ///
    /// Called once at startup; any I/O failure here is fatal.
    pub fn prepare_output_dirs(&self, root: &Path) -> Result<()> {
        for name in &self.camera_names {
            let dir = root.join(name);
            info!("checking folder path: {}", dir.display());
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
