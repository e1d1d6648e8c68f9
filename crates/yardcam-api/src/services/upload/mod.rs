//! Image upload pipeline: validate → name → ensure container → store with retry

pub mod naming;
pub mod service;
pub mod types;
pub mod validation;

pub use service::ImageUploadService;
pub use types::{StoredImage, ValidatedUpload};
pub use validation::validate_upload;
