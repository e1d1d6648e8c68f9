//! Shared constants for the upload pipeline.

/// Container that receives uploaded yard photos.
pub const DEFAULT_CONTAINER_NAME: &str = "yard-images";

/// Content type of every stored image.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Extension appended to derived blob names.
pub const JPEG_EXTENSION: &str = ".jpg";

/// Prefix marking a base64 payload as a JPEG data URI.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

pub const BYTES_PER_MEGABYTE: usize = 1024 * 1024;

/// Header carrying the function-level auth token.
pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";

/// Query parameter alternative to [`FUNCTION_KEY_HEADER`].
pub const FUNCTION_KEY_QUERY_PARAM: &str = "code";

/// Blob metadata key recording the uploading user.
pub const USER_ID_METADATA_KEY: &str = "userId";
