//! Capture session
//!
//! A [`CaptureSession`] walks one photo through permission, capture, preview and compression.
//! The camera, the encoder and the caller are reached through traits so the session can be
//! driven by a real device, by an image file ([`FileCamera`]) or by test doubles.

mod camera;
mod encoder;
mod listener;
mod session;
mod state;

pub use camera::{CameraDevice, CapturedPhoto, FileCamera, PhotoSource};
pub use encoder::{JpegReencoder, PhotoEncoder};
pub use listener::{CaptureListener, CollectingListener};
pub use session::CaptureSession;
pub use state::{CaptureState, PermissionStatus};
