//! Yardcam API Library
//!
//! This crate provides the upload endpoint: HTTP handlers, function-key auth, the upload
//! service, and application setup.

// Module declarations
pub mod constants;
mod handlers;
pub mod services;
pub mod setup;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::HttpAppError;
pub use state::AppState;
