//! Tiling of per-camera frames into the 2-column monitoring grid.

use crate::draw;
use crate::source::{CaptureError, Resolution, Result};
use chrono::Local;
use image::imageops;
use image::{Rgb, RgbImage};
use std::fs;

/// Columns in the display grid.
const GRID_COLUMNS: u32 = 2;

const PLACEHOLDER_TEXT: &str = "Press Ctrl-C to stop";
const LABEL_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const PLACEHOLDER_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Arranges display-resolution tiles into a fixed 2-column grid.
///
/// Composition does no scaling: every tile must already match the
/// configured display resolution.
#[derive(Debug, Clone, Copy)]
pub struct LayoutCompositor {
    display: Resolution,
}

impl LayoutCompositor {
    /// Create a compositor for the given per-tile resolution.
    #[must_use]
    pub const fn new(display: Resolution) -> Self {
        Self { display }
    }

    /// Tile the frames into a grid of `ceil(N / 2)` rows.
    ///
    /// An odd tile count gets one synthetic placeholder appended so the
    /// tiling divides evenly. The output is exactly
    /// `(2 * w, ceil(N / 2) * h)` pixels.
    pub fn compose(&self, mut tiles: Vec<RgbImage>) -> Result<RgbImage> {
        for tile in &tiles {
            let got = Resolution::new(tile.width(), tile.height());
            if got != self.display {
                return Err(CaptureError::LayoutMismatch {
                    expected: self.display,
                    got,
                });
            }
        }
        if tiles.is_empty() {
            return Err(CaptureError::Config("nothing to compose".to_owned()));
        }

        if tiles.len() % 2 == 1 {
            tiles.push(self.placeholder());
        }

        let rows = tiles.len() as u32 / GRID_COLUMNS;
        let (w, h) = (self.display.width, self.display.height);
        let mut grid = RgbImage::new(GRID_COLUMNS * w, rows * h);
        for (idx, tile) in tiles.iter().enumerate() {
            let idx = idx as u32;
            let x = i64::from((idx % GRID_COLUMNS) * w);
            let y = i64::from((idx / GRID_COLUMNS) * h);
            imageops::replace(&mut grid, tile, x, y);
        }
        Ok(grid)
    }

    /// The odd-camera-out tile: black, with an instructional line, the
    /// current timestamp and the CPU temperature readout.
    ///
    /// Always sized to the configured display resolution, never derived
    /// from another frame; the first real frame may not exist this cycle.
    fn placeholder(&self) -> RgbImage {
        let mut tile = RgbImage::new(self.display.width, self.display.height);
        #[allow(clippy::cast_possible_wrap)]
        let middle = (self.display.height / 2) as i32;
        draw::draw_text_centered(&mut tile, middle, PLACEHOLDER_TEXT, PLACEHOLDER_TEXT_COLOR);
        let stamp = Local::now().format("%Y/%m/%d/%H:%M:%S").to_string();
        draw::draw_text_centered(&mut tile, middle + 20, &stamp, PLACEHOLDER_TEXT_COLOR);
        draw::draw_text_centered(
            &mut tile,
            middle + 40,
            &cpu_temperature(),
            PLACEHOLDER_TEXT_COLOR,
        );
        tile
    }
}

/// Scale a frame to the display resolution for use as a grid tile.
#[must_use]
pub fn scale_to_tile(image: &RgbImage, display: Resolution) -> RgbImage {
    if image.width() == display.width && image.height() == display.height {
        return image.clone();
    }
    imageops::resize(
        image,
        display.width,
        display.height,
        imageops::FilterType::Triangle,
    )
}

/// Overlay the camera name centered near the top of a tile.
pub fn label_tile(tile: &mut RgbImage, name: &str) {
    draw::draw_text_centered(tile, 13, name, LABEL_COLOR);
}

/// Current CPU temperature as a display string.
///
/// Read failures never propagate; a placeholder string is returned instead.
pub(crate) fn cpu_temperature() -> String {
    match read_cpu_millidegrees() {
        Some(millis) => {
            let degrees = f64::from(millis) / 1000.0;
            format!("CPU Temperature: {degrees:.1}'C")
        }
        None => "CPU Temperature: unavailable".to_owned(),
    }
}

fn read_cpu_millidegrees() -> Option<i32> {
    let text = fs::read_to_string("/sys/class/thermal/thermal_zone0/temp").ok()?;
    text.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([10, 20, 30]))
    }

    #[test]
    fn test_even_count_grid_dimensions() {
        let compositor = LayoutCompositor::new(Resolution::new(80, 60));
        let grid = compositor
            .compose(vec![tile(80, 60), tile(80, 60), tile(80, 60), tile(80, 60)])
            .expect("compose should succeed");
        assert_eq!(grid.width(), 160);
        assert_eq!(grid.height(), 120);
    }

    #[test]
    fn test_odd_count_appends_placeholder() {
        let compositor = LayoutCompositor::new(Resolution::new(80, 60));
        let grid = compositor
            .compose(vec![tile(80, 60), tile(80, 60), tile(80, 60)])
            .expect("compose should succeed");
        // ceil(3 / 2) = 2 rows
        assert_eq!(grid.width(), 160);
        assert_eq!(grid.height(), 120);
        // Bottom-right cell is the placeholder: black background, not tile color
        assert_eq!(grid.get_pixel(159, 119).0, [0, 0, 0]);
        // Bottom-left cell is the third real tile
        assert_eq!(grid.get_pixel(0, 119).0, [10, 20, 30]);
    }

    #[test]
    fn test_single_tile_still_pairs_with_placeholder() {
        let compositor = LayoutCompositor::new(Resolution::new(80, 60));
        let grid = compositor
            .compose(vec![tile(80, 60)])
            .expect("compose should succeed");
        assert_eq!(grid.width(), 160);
        assert_eq!(grid.height(), 60);
    }

    #[test]
    fn test_mismatched_tile_rejected() {
        let compositor = LayoutCompositor::new(Resolution::new(80, 60));
        let err = compositor
            .compose(vec![tile(80, 60), tile(64, 48)])
            .expect_err("mismatch should fail");
        assert!(matches!(err, CaptureError::LayoutMismatch { .. }));
    }

    #[test]
    fn test_empty_input_rejected() {
        let compositor = LayoutCompositor::new(Resolution::new(80, 60));
        assert!(compositor.compose(Vec::new()).is_err());
    }

    #[test]
    fn test_scale_to_tile_resizes() {
        let scaled = scale_to_tile(&tile(160, 120), Resolution::new(80, 60));
        assert_eq!(scaled.width(), 80);
        assert_eq!(scaled.height(), 60);
    }

    #[test]
    fn test_label_tile_draws_red() {
        let mut t = tile(120, 60);
        label_tile(&mut t, "floor_2");
        assert!(t.pixels().any(|p| p.0 == [255, 0, 0]));
    }

    #[test]
    fn test_cpu_temperature_never_panics() {
        let text = cpu_temperature();
        assert!(text.starts_with("CPU Temperature:"));
    }
}
