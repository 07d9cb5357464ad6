//! V4L2 camera source implementation using the v4l crate.

use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream as V4lCaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::source::{
    CameraId, CameraSession, CameraSource, CaptureError, Frame, Resolution, Result,
};
use chrono::Local;
use image::RgbImage;
use log::{debug, info};

const YUYV: &[u8; 4] = b"YUYV";

/// Camera source backed by V4L2 devices (/dev/video*).
#[derive(Debug, Default)]
pub struct V4l2Source;

impl V4l2Source {
    /// Create a new V4L2 source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CameraSource for V4l2Source {
    type Session = V4l2Session;

    fn open(&mut self, camera: CameraId, resolution: Resolution) -> Result<Self::Session> {
        let device = Device::new(camera as usize).map_err(|err| CaptureError::DeviceOpenFailed {
            camera,
            reason: err.to_string(),
        })?;

        let caps = device
            .query_caps()
            .map_err(|err| CaptureError::DeviceOpenFailed {
                camera,
                reason: err.to_string(),
            })?;
        debug!("camera {camera}: {} ({})", caps.card, caps.driver);

        let mut fmt = device.format().map_err(|err| CaptureError::StreamError {
            camera,
            reason: err.to_string(),
        })?;
        fmt.width = resolution.width;
        fmt.height = resolution.height;
        fmt.fourcc = v4l::FourCC::new(YUYV);

        let actual = device
            .set_format(&fmt)
            .map_err(|err| CaptureError::StreamError {
                camera,
                reason: err.to_string(),
            })?;
        if actual.width != resolution.width || actual.height != resolution.height {
            info!(
                "camera {camera}: driver negotiated {}x{} instead of {resolution}",
                actual.width, actual.height
            );
        }

        Ok(V4l2Session {
            device: Some(device),
            camera,
            width: actual.width,
            height: actual.height,
        })
    }
}

/// One open V4L2 device, valid for a single capture cycle.
pub struct V4l2Session {
    device: Option<Device>,
    camera: CameraId,
    width: u32,
    height: u32,
}

impl CameraSession for V4l2Session {
    fn read(&mut self) -> Result<Frame> {
        let device = self.device.as_ref().ok_or_else(|| CaptureError::StreamError {
            camera: self.camera,
            reason: "session already released".to_owned(),
        })?;

        // The stream only lives for this one grab; mmap buffers are
        // returned to the driver as soon as it drops.
        let mut stream = Stream::with_buffers(device, Type::VideoCapture, 2).map_err(|err| {
            CaptureError::StreamError {
                camera: self.camera,
                reason: err.to_string(),
            }
        })?;

        let (buf, _meta) = stream.next().map_err(|err| CaptureError::StreamError {
            camera: self.camera,
            reason: err.to_string(),
        })?;

        let image =
            yuyv_to_rgb(buf, self.width, self.height).ok_or_else(|| CaptureError::StreamError {
                camera: self.camera,
                reason: format!(
                    "short frame: {} bytes for {}x{} YUYV",
                    buf.len(),
                    self.width,
                    self.height
                ),
            })?;

        Ok(Frame {
            image,
            camera: self.camera,
            captured_at: Local::now(),
        })
    }

    fn release(&mut self) {
        if self.device.take().is_some() {
            debug!("camera {}: released", self.camera);
        }
    }
}

impl Drop for V4l2Session {
    fn drop(&mut self) {
        self.release();
    }
}

/// Decode a packed YUYV buffer into an RGB image.
///
/// Returns `None` if the buffer is too short for the given dimensions.
fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Option<RgbImage> {
    let needed = (width as usize).checked_mul(height as usize)?.checked_mul(2)?;
    let data = data.get(..needed)?;

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for chunk in data.chunks_exact(4) {
        let y0 = *chunk.first()?;
        let u = *chunk.get(1)?;
        let y1 = *chunk.get(2)?;
        let v = *chunk.get(3)?;

        let (r, g, b) = yuv_to_rgb(y0, u, v);
        rgb.extend_from_slice(&[r, g, b]);
        let (r, g, b) = yuv_to_rgb(y1, u, v);
        rgb.extend_from_slice(&[r, g, b]);
    }

    RgbImage::from_vec(width, height, rgb)
}

/// Convert YUV values to RGB using the ITU-R BT.601 formula.
#[must_use]
#[allow(clippy::many_single_char_names)]
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y_f = f32::from(y);
    let u_f = f32::from(u) - 128.0;
    let v_f = f32::from(v) - 128.0;

    let r = 1.402f32.mul_add(v_f, y_f);
    let g = 0.714_14f32.mul_add(-v_f, 0.344_14f32.mul_add(-u_f, y_f));
    let b = 1.772f32.mul_add(u_f, y_f);

    let clamp = |val: f32| -> u8 {
        if val < 0.0 {
            0
        } else if val > 255.0 {
            255
        } else {
            #[allow(clippy::cast_possible_truncation)]
            #[allow(clippy::cast_sign_loss)]
            {
                val as u8
            }
        }
    };

    (clamp(r), clamp(g), clamp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_decode_dimensions() {
        // 4x2 YUYV frame, all neutral gray
        let data = vec![128u8; 4 * 2 * 2];
        let image = yuyv_to_rgb(&data, 4, 2).expect("decode should succeed");
        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 2);
    }

    #[test]
    fn test_yuyv_decode_short_buffer() {
        let data = vec![128u8; 7];
        assert!(yuyv_to_rgb(&data, 4, 2).is_none());
    }

    #[test]
    fn test_yuv_neutral_is_gray() {
        let (r, g, b) = yuv_to_rgb(128, 128, 128);
        assert_eq!((r, g, b), (128, 128, 128));
    }

    #[test]
    fn test_yuv_black_and_white() {
        let (r, g, b) = yuv_to_rgb(0, 128, 128);
        assert_eq!((r, g, b), (0, 0, 0));
        let (r, g, b) = yuv_to_rgb(255, 128, 128);
        assert_eq!((r, g, b), (255, 255, 255));
    }
}
