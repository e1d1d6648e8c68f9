//! Yardcam Storage Library
//!
//! This crate provides the blob store abstraction used by the upload endpoint and its
//! implementations for Azure Blob Storage and the local filesystem.
//!
//! # Layout
//!
//! Blobs are addressed as `{container}/{key}`. Keys are flat file names produced by the upload
//! service; container and key validation is centralized in the `keys` module so all backends
//! reject the same names.

pub mod connection_string;
pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-azure")]
pub mod azure;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-azure")]
pub use azure::AzureBlobStorage;
pub use connection_string::{AzureConnectionString, ConnectionStringError};
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{BlobMetadata, BlobStore, ContainerStatus, StorageError, StorageResult};
pub use yardcam_core::{PublicAccess, StorageBackend};
