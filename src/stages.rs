//! Optional per-frame post-processing stages.
//!
//! Stages run in order on every real frame, after read and before
//! compositing and saving. The gamma stage reproduces the brightness
//! reduction one deployment applies to overexposed daylight captures.

use image::RgbImage;

/// A post-processing step applied to each captured frame.
pub trait FrameStage {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Produce the processed frame.
    fn apply(&self, image: &RgbImage) -> RgbImage;
}

/// Gamma correction through a precomputed 256-entry lookup table.
pub struct GammaStage {
    table: [u8; 256],
}

impl GammaStage {
    /// Build a gamma stage. Values below 1.0 darken the image.
    #[must_use]
    pub fn new(gamma: f32) -> Self {
        let inv_gamma = 1.0 / gamma;
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let value = ((i as f32 / 255.0).powf(inv_gamma) * 255.0).round() as u8;
            *entry = value;
        }
        Self { table }
    }
}

impl FrameStage for GammaStage {
    fn name(&self) -> &str {
        "gamma"
    }

    fn apply(&self, image: &RgbImage) -> RgbImage {
        let mut out = image.clone();
        for pixel in out.pixels_mut() {
            for channel in &mut pixel.0 {
                *channel = self.table[usize::from(*channel)];
            }
        }
        out
    }
}
