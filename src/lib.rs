//! Gridcam: scheduled multi-camera snapshot capture for embedded hosts.
//!
//! The crate is built around one cyclic control loop: inside a configured
//! daylight window it opens every camera, reads one frame each, releases
//! the devices, substitutes diagnostic frames for failures, composes a
//! 2-column monitoring grid, and persists timestamped snapshots on a fixed
//! interval. Camera access goes through the [`source::CameraSource`] seam,
//! with a V4L2 backend for hardware and a deterministic synthetic backend
//! for tests.

pub mod config;
mod draw;
pub mod health;
pub mod layout;
pub mod scheduler;
pub mod source;
pub mod stages;
pub mod store;
pub mod synthetic;
pub mod v4l2;

pub use config::CaptureConfig;
pub use scheduler::{AcquisitionScheduler, CancelToken};
pub use source::{CameraId, CameraSession, CameraSource, CaptureError, Frame, Resolution};
pub use store::FrameStore;
pub use v4l2::V4l2Source;
