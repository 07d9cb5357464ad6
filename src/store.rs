//! Snapshot persistence and the last-activity marker file.

use crate::source::{Frame, Result};
use chrono::{DateTime, Local};
use image::RgbImage;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

const MARKER_FILE: &str = "last_time.txt";
const GRID_FILE: &str = "latest_grid.jpg";

/// Writes snapshots into per-camera directories under a fixed root.
#[derive(Debug, Clone)]
pub struct FrameStore {
    root: PathBuf,
}

impl FrameStore {
    /// Create a store rooted at `root`. The per-camera directories must
    /// already exist (see `CaptureConfig::prepare_output_dirs`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one frame into the directory for `camera_name`.
    ///
    /// The file is named by the frame's capture timestamp at one-second
    /// resolution. Returns the path written.
    pub fn save(&self, frame: &Frame, camera_name: &str) -> Result<PathBuf> {
        let stamp = frame.captured_at.format("%Y-%m-%d-%H-%M-%S");
        let path = self.root.join(camera_name).join(format!("{stamp}.jpg"));
        frame.image.save(&path)?;
        debug!("saved camera {} frame to {}", frame.camera, path.display());
        Ok(path)
    }

    /// Overwrite the marker file with `now`, formatted `YYYY-MM-DD HH:MM:SS`.
    ///
    /// Rewritten every cycle whether or not snapshots were persisted; this
    /// file is the only state shared with the external telemetry service.
    pub fn write_marker(&self, now: DateTime<Local>) -> Result<()> {
        let stamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
        fs::write(self.marker_path(), stamp)?;
        Ok(())
    }

    /// Path of the marker file.
    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        self.root.join(MARKER_FILE)
    }

    /// Overwrite the headless live view with the latest composed grid.
    pub fn publish_grid(&self, grid: &RgbImage) -> Result<()> {
        grid.save(self.root.join(GRID_FILE))?;
        Ok(())
    }

    /// Path of the headless live view image.
    #[must_use]
    pub fn grid_path(&self) -> PathBuf {
        self.root.join(GRID_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use image::Rgb;

    fn frame_at(stamp: &str) -> Frame {
        let naive = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S")
            .expect("test timestamp should parse");
        let captured_at = naive
            .and_local_timezone(Local)
            .single()
            .expect("unambiguous local time");
        Frame {
            image: RgbImage::from_pixel(16, 12, Rgb([1, 2, 3])),
            camera: 0,
            captured_at,
        }
    }

    #[test]
    fn test_save_names_file_by_timestamp() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(root.path().join("A")).expect("camera dir");
        let store = FrameStore::new(root.path());

        let path = store
            .save(&frame_at("2024-06-01 12:30:05"), "A")
            .expect("save should succeed");
        assert_eq!(
            path,
            root.path().join("A").join("2024-06-01-12-30-05.jpg")
        );
        assert!(path.is_file());
    }

    #[test]
    fn test_save_into_missing_directory_errors() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = FrameStore::new(root.path());
        assert!(store.save(&frame_at("2024-06-01 12:30:05"), "nope").is_err());
    }

    #[test]
    fn test_marker_is_overwritten() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = FrameStore::new(root.path());

        store.write_marker(Local::now()).expect("first write");
        let first = fs::read_to_string(store.marker_path()).expect("read marker");
        assert!(NaiveDateTime::parse_from_str(&first, "%Y-%m-%d %H:%M:%S").is_ok());

        store.write_marker(Local::now()).expect("second write");
        let second = fs::read_to_string(store.marker_path()).expect("read marker");
        assert!(NaiveDateTime::parse_from_str(&second, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn test_publish_grid_writes_latest() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = FrameStore::new(root.path());
        let grid = RgbImage::from_pixel(32, 24, Rgb([9, 9, 9]));
        store.publish_grid(&grid).expect("publish should succeed");
        assert!(store.grid_path().is_file());
    }
}
