use super::camera::CapturedPhoto;

/// Camera permission as last reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    #[default]
    Unknown,
    Granted,
    Denied,
}

/// Lifecycle of a capture session
///
/// ```text
/// RequestingPermission -> Denied | Ready
/// Ready -> Capturing -> Previewing
/// Previewing -> Ready (retake) | Compressing
/// Compressing -> Done | Previewing (error) | Cancelled
/// Capturing -> Denied (permission revoked) | Ready (device error)
/// ```
///
/// `Done` and `Cancelled` are terminal.
#[derive(Debug, Clone)]
pub enum CaptureState {
    RequestingPermission,
    Denied,
    Ready {
        camera_ready: bool,
    },
    Capturing,
    Previewing {
        photo: CapturedPhoto,
        /// Message from the last failed compression, shown alongside the preview
        error: Option<String>,
    },
    Compressing,
    Done,
    Cancelled,
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::RequestingPermission => "requesting permission",
            CaptureState::Denied => "denied",
            CaptureState::Ready { .. } => "ready",
            CaptureState::Capturing => "capturing",
            CaptureState::Previewing { .. } => "previewing",
            CaptureState::Compressing => "compressing",
            CaptureState::Done => "done",
            CaptureState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureState::Done | CaptureState::Cancelled)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            CaptureState::RequestingPermission
                | CaptureState::Denied
                | CaptureState::Ready { .. }
                | CaptureState::Previewing { .. }
                | CaptureState::Compressing
        )
    }
}
