use super::camera::CameraDevice;
use super::encoder::PhotoEncoder;
use super::listener::CaptureListener;
use super::state::{CaptureState, PermissionStatus};
use crate::compression::CompressionSettings;
use crate::error::{CaptureError, CaptureResult};

/// One capture-and-compress cycle
///
/// Every transition takes `&mut self`, so a second capture or compression cannot start while
/// one is in flight. Dropping a `compress()` future before it completes discards its result
/// and leaves the session in `Compressing`, from which only `cancel()` is accepted.
pub struct CaptureSession<C, E, L> {
    camera: C,
    encoder: E,
    listener: L,
    settings: CompressionSettings,
    permission: PermissionStatus,
    state: CaptureState,
}

impl<C, E, L> CaptureSession<C, E, L>
where
    C: CameraDevice,
    E: PhotoEncoder,
    L: CaptureListener,
{
    pub fn new(
        camera: C,
        encoder: E,
        listener: L,
        settings: CompressionSettings,
    ) -> CaptureResult<Self> {
        settings.validate()?;
        Ok(Self {
            camera,
            encoder,
            listener,
            settings,
            permission: PermissionStatus::Unknown,
            state: CaptureState::RequestingPermission,
        })
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn permission(&self) -> PermissionStatus {
        self.permission
    }

    pub fn settings(&self) -> &CompressionSettings {
        &self.settings
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Message from the last failed compression, if the preview is showing one
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            CaptureState::Previewing { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    /// Poll the device and report whether a capture can be taken now
    pub fn camera_ready(&mut self) -> bool {
        match &mut self.state {
            CaptureState::Ready { camera_ready } => {
                *camera_ready = self.camera.is_ready();
                *camera_ready
            }
            _ => false,
        }
    }

    fn invalid(&self, operation: &'static str) -> CaptureError {
        CaptureError::InvalidTransition {
            operation,
            state: self.state.name(),
        }
    }

    /// Ask for camera access. Allowed initially and again after a denial.
    pub async fn request_permission(&mut self) -> CaptureResult<PermissionStatus> {
        if !matches!(
            self.state,
            CaptureState::RequestingPermission | CaptureState::Denied
        ) {
            return Err(self.invalid("request permission"));
        }

        self.state = CaptureState::RequestingPermission;
        let status = self.camera.request_permission().await;
        self.permission = status;

        match status {
            PermissionStatus::Granted => {
                self.state = CaptureState::Ready {
                    camera_ready: self.camera.is_ready(),
                };
                tracing::debug!("Camera permission granted");
                Ok(status)
            }
            PermissionStatus::Denied | PermissionStatus::Unknown => {
                self.state = CaptureState::Denied;
                tracing::info!(permission = ?status, "Camera permission not granted");
                Err(CaptureError::PermissionDenied)
            }
        }
    }

    /// Take a full-resolution photo and show it for preview. Does not compress.
    pub async fn capture(&mut self) -> CaptureResult<()> {
        if !matches!(self.state, CaptureState::Ready { .. }) {
            return Err(CaptureError::CaptureUnavailable(format!(
                "camera is not available while {}",
                self.state.name()
            )));
        }
        if !self.camera_ready() {
            return Err(CaptureError::CaptureUnavailable(
                "camera is not ready".to_string(),
            ));
        }

        self.state = CaptureState::Capturing;

        match self.camera.capture().await {
            Ok(photo) => {
                tracing::debug!(
                    width = ?photo.width,
                    height = ?photo.height,
                    "Photo captured"
                );
                self.state = CaptureState::Previewing { photo, error: None };
                Ok(())
            }
            Err(CaptureError::PermissionDenied) => {
                tracing::info!("Camera permission revoked during capture");
                self.permission = PermissionStatus::Denied;
                self.state = CaptureState::Denied;
                Err(CaptureError::PermissionDenied)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Capture failed");
                self.state = CaptureState::Ready {
                    camera_ready: self.camera.is_ready(),
                };
                Err(e)
            }
        }
    }

    /// Compress the previewed photo and hand it to the listener.
    ///
    /// On failure the session returns to the preview with the original photo and an error
    /// message; nothing is retried automatically.
    pub async fn compress(&mut self) -> CaptureResult<()> {
        let photo = match std::mem::replace(&mut self.state, CaptureState::Compressing) {
            CaptureState::Previewing { photo, .. } => photo,
            other => {
                self.state = other;
                return Err(self.invalid("compress"));
            }
        };

        let result = match self.encoder.reencode(&photo, &self.settings).await {
            Ok(compressed) if compressed.is_empty() => Err(CaptureError::CompressionFailed(
                "encoder returned no data".to_string(),
            )),
            Ok(compressed) => Ok(compressed),
            Err(CaptureError::CompressionFailed(message)) => {
                Err(CaptureError::CompressionFailed(message))
            }
            Err(other) => Err(CaptureError::CompressionFailed(other.to_string())),
        };

        match result {
            Ok(compressed) => {
                tracing::info!(
                    size_bytes = compressed.len(),
                    width = compressed.width(),
                    height = compressed.height(),
                    "Photo ready for upload"
                );
                self.state = CaptureState::Done;
                self.listener.on_capture(compressed);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Compression failed");
                self.state = CaptureState::Previewing {
                    photo,
                    error: Some(e.to_string()),
                };
                Err(e)
            }
        }
    }

    /// Discard the previewed photo and go back to the live camera
    pub fn retake(&mut self) -> CaptureResult<()> {
        if !matches!(self.state, CaptureState::Previewing { .. }) {
            return Err(self.invalid("retake"));
        }
        self.state = CaptureState::Ready {
            camera_ready: self.camera.is_ready(),
        };
        Ok(())
    }

    /// End the session without a photo
    pub fn cancel(&mut self) -> CaptureResult<()> {
        if !self.state.can_cancel() {
            return Err(self.invalid("cancel"));
        }
        self.state = CaptureState::Cancelled;
        self.listener.on_cancel();
        tracing::debug!("Capture session cancelled");
        Ok(())
    }
}
