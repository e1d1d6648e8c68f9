use crate::compression::CompressedPhoto;

/// Receives the outcome of a capture session
pub trait CaptureListener: Send {
    /// Called exactly once when compression succeeds. `photo.to_data_uri()` gives the
    /// `data:image/jpeg;base64,` form.
    fn on_capture(&mut self, photo: CompressedPhoto);

    /// Called exactly once when the session is cancelled
    fn on_cancel(&mut self);
}

/// Listener that keeps what it is given
#[derive(Debug, Default)]
pub struct CollectingListener {
    pub captured: Vec<CompressedPhoto>,
    pub cancellations: usize,
}

impl CollectingListener {
    pub fn take_photo(&mut self) -> Option<CompressedPhoto> {
        self.captured.pop()
    }
}

impl CaptureListener for CollectingListener {
    fn on_capture(&mut self, photo: CompressedPhoto) {
        self.captured.push(photo);
    }

    fn on_cancel(&mut self) {
        self.cancellations += 1;
    }
}
