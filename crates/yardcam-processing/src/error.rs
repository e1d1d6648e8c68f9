use thiserror::Error;

/// Errors raised by the capture-and-compress client
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Invalid compression settings: {0}")]
    InvalidSettings(String),
}

impl CaptureError {
    /// Whether the user can act on the error and try again (grant permission, retake, retry).
    /// Programming errors such as invalid transitions or settings are not recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CaptureError::PermissionDenied
                | CaptureError::CaptureUnavailable(_)
                | CaptureError::CompressionFailed(_)
        )
    }
}

pub type CaptureResult<T> = Result<T, CaptureError>;
