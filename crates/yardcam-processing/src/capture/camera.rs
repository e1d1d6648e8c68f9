use super::state::PermissionStatus;
use crate::error::{CaptureError, CaptureResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

/// Where a captured photo's full-resolution bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    File(PathBuf),
    Memory(Bytes),
}

/// Full-resolution capture, held only until it is compressed or retaken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    pub source: PhotoSource,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl CapturedPhoto {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: PhotoSource::File(path.into()),
            width: None,
            height: None,
        }
    }

    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            source: PhotoSource::Memory(data.into()),
            width: None,
            height: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub async fn read_bytes(&self) -> std::io::Result<Bytes> {
        match &self.source {
            PhotoSource::File(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
            PhotoSource::Memory(data) => Ok(data.clone()),
        }
    }
}

/// Camera hardware seen by a capture session
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Ask the user (or the OS) for camera access
    async fn request_permission(&self) -> PermissionStatus;

    /// Whether the live preview is initialised and a capture can be taken
    fn is_ready(&self) -> bool;

    /// Take one full-resolution photo
    ///
    /// Device failures are reported as `CaptureUnavailable`, revoked access as
    /// `PermissionDenied`.
    async fn capture(&self) -> CaptureResult<CapturedPhoto>;
}

/// A camera whose "capture" returns an existing image file
pub struct FileCamera {
    path: PathBuf,
    permission: PermissionStatus,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            permission: PermissionStatus::Granted,
        }
    }

    pub fn with_permission(mut self, permission: PermissionStatus) -> Self {
        self.permission = permission;
        self
    }
}

#[async_trait]
impl CameraDevice for FileCamera {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    fn is_ready(&self) -> bool {
        self.permission == PermissionStatus::Granted && self.path.is_file()
    }

    async fn capture(&self) -> CaptureResult<CapturedPhoto> {
        if self.permission != PermissionStatus::Granted {
            return Err(CaptureError::PermissionDenied);
        }

        let path = self.path.clone();
        let dimensions = tokio::task::spawn_blocking(move || image::image_dimensions(&path))
            .await
            .map_err(|e| CaptureError::CaptureUnavailable(e.to_string()))?
            .map_err(|e| {
                CaptureError::CaptureUnavailable(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        tracing::debug!(
            path = %self.path.display(),
            width = dimensions.0,
            height = dimensions.1,
            "Photo captured from file"
        );

        Ok(CapturedPhoto::from_file(&self.path).with_dimensions(dimensions.0, dimensions.1))
    }
}
