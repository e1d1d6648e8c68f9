//! Wire models for the upload endpoint.

mod upload;

pub use upload::{bytes_to_megabytes, ErrorResponse, UploadImageRequest, UploadImageResponse};
