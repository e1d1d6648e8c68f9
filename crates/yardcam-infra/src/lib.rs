//! Yardcam Infrastructure Library
//!
//! This crate provides shared infrastructure components used by the upload service and the
//! command-line client:
//! - Middleware (request ID)
//! - Telemetry initialization
//! - Retry with exponential backoff

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "retry")]
pub mod retry;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{get_request_id, request_id_middleware, RequestId, REQUEST_ID_HEADER};

#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;

#[cfg(feature = "retry")]
pub use retry::{retry_with_backoff, RetryError, RetryPolicy};
