//! Blob store abstraction
//!
//! This module defines the BlobStore trait that all storage backends must implement.

use crate::{PublicAccess, StorageBackend};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Container operation failed: {0}")]
    ContainerFailed(String),

    #[error("Conflicting blob state: {0}")]
    Conflict(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether repeating the same call may succeed.
    ///
    /// Network faults, throttling and server-side failures are transient. Rejected names,
    /// credentials and configuration are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StorageError::UploadFailed(_) | StorageError::BackendError(_) | StorageError::IoError(_)
        )
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of [`BlobStore::ensure_container`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Created,
    AlreadyExists,
}

/// User-defined key/value pairs stored alongside a blob.
pub type BlobMetadata = HashMap<String, String>;

/// Blob store abstraction trait
///
/// The upload service talks to the remote object store only through this trait, so tests can
/// substitute an in-memory store and the local backend can stand in during development.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create the container if it does not exist.
    ///
    /// Must be idempotent: a container that already exists (including one created by a
    /// concurrent caller between check and create) is success, not an error.
    async fn ensure_container(
        &self,
        container: &str,
        access: PublicAccess,
    ) -> StorageResult<ContainerStatus>;

    /// Write `data` under `key`, overwriting any existing blob, and return its public URL.
    async fn put_blob(
        &self,
        container: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &BlobMetadata,
    ) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
