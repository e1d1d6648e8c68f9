//! Route paths served by the API

/// Upload route as deployed behind the function host's root
pub const UPLOAD_IMAGE_PATH: &str = "/UploadImage";

/// Upload route under the function host's default `/api` prefix
pub const API_UPLOAD_IMAGE_PATH: &str = "/api/UploadImage";

pub const HEALTH_PATH: &str = "/health";

/// Service name reported in logs
pub const SERVICE_NAME: &str = "yardcam-api";
