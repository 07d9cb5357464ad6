//! Core capture types and the camera source abstraction.

use chrono::{DateTime, Local};
use image::RgbImage;

/// Identifier of a physical capture device (e.g., 0 for /dev/video0).
pub type CameraId = u32;

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a new resolution.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A captured RGB frame with its provenance.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded pixel data, 8-bit RGB.
    pub image: RgbImage,
    /// Device the frame was read from.
    pub camera: CameraId,
    /// Local wall-clock time at capture.
    pub captured_at: DateTime<Local>,
}

impl Frame {
    /// Dimensions of the pixel buffer.
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.image.width(), self.image.height())
    }
}

/// Error type for capture operations.
#[derive(Debug)]
pub enum CaptureError {
    /// Configuration failed to parse or validate.
    Config(String),
    /// Failed to open a capture device.
    DeviceOpenFailed {
        /// Device that failed to open.
        camera: CameraId,
        /// Driver-reported reason.
        reason: String,
    },
    /// Error while reading from an open device.
    StreamError {
        /// Device the read came from.
        camera: CameraId,
        /// Driver-reported reason.
        reason: String,
    },
    /// A frame entered composition at the wrong size.
    LayoutMismatch {
        /// Size the compositor was configured for.
        expected: Resolution,
        /// Size the offending frame actually has.
        got: Resolution,
    },
    /// Image encoding or decoding error.
    Image(image::ImageError),
    /// I/O error.
    Io(std::io::Error),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Invalid configuration: {msg}"),
            Self::DeviceOpenFailed { camera, reason } => {
                write!(f, "Failed to open camera {camera}: {reason}")
            }
            Self::StreamError { camera, reason } => {
                write!(f, "Stream error on camera {camera}: {reason}")
            }
            Self::LayoutMismatch { expected, got } => {
                write!(f, "Frame size {got} does not match display size {expected}")
            }
            Self::Image(err) => write!(f, "Image error: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}

/// Result type for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Abstraction over a family of capture devices.
///
/// The scheduler opens every configured camera through this seam once per
/// cycle and releases the sessions before sleeping, so implementations must
/// tolerate frequent open/release churn on the same identifier.
pub trait CameraSource {
    /// The per-cycle session type returned by `open`.
    type Session: CameraSession;

    /// Open a device and apply the capture resolution before the first read.
    fn open(&mut self, camera: CameraId, resolution: Resolution) -> Result<Self::Session>;
}

/// A short-lived handle on one open capture device.
pub trait CameraSession {
    /// Grab a single frame.
    fn read(&mut self) -> Result<Frame>;

    /// Free the device handle. Idempotent; also runs on drop, so the handle
    /// is released on every exit path.
    fn release(&mut self);
}
