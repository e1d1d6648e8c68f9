//! Yardcam Processing Library
//!
//! This crate provides the capture-and-compress client:
//! - JPEG compression with a bounded output width
//! - The capture session state machine and its camera, encoder and listener seams

pub mod capture;
pub mod compression;
pub mod error;

// Re-export commonly used types
pub use capture::{
    CameraDevice, CaptureListener, CaptureSession, CaptureState, CapturedPhoto,
    CollectingListener, FileCamera, JpegReencoder, PermissionStatus, PhotoEncoder, PhotoSource,
};
pub use compression::{CompressedPhoto, CompressionSettings, ImageCompressor};
pub use error::{CaptureError, CaptureResult};
