//! In-memory blob store with scripted failures.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use yardcam_storage::{
    BlobMetadata, BlobStore, ContainerStatus, PublicAccess, StorageBackend, StorageError,
    StorageResult,
};

pub const TEST_BLOB_ENDPOINT: &str = "https://yardcamtest.blob.core.windows.net";

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub data: Bytes,
    pub content_type: String,
    pub metadata: BlobMetadata,
}

/// How scripted `put_blob` failures fail.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Retryable, like a 503 from the service
    Transient,
    /// Not retryable, like a rejected credential
    Permanent,
}

impl Failure {
    fn error(self) -> StorageError {
        match self {
            Failure::Transient => StorageError::BackendError("503 Server Busy".to_string()),
            Failure::Permanent => {
                StorageError::AccessDenied("Server failed to authenticate the request".to_string())
            }
        }
    }
}

/// Blob store that fails the first `failures` puts and then succeeds.
pub struct FlakyBlobStore {
    failures_remaining: AtomicU32,
    failure: Failure,
    ensure_calls: AtomicUsize,
    put_calls: AtomicUsize,
    containers: Mutex<HashSet<String>>,
    blobs: Mutex<HashMap<String, StoredBlob>>,
}

impl FlakyBlobStore {
    pub fn new() -> Self {
        Self::failing(0, Failure::Transient)
    }

    pub fn failing(failures: u32, failure: Failure) -> Self {
        Self {
            failures_remaining: AtomicU32::new(failures),
            failure,
            ensure_calls: AtomicUsize::new(0),
            put_calls: AtomicUsize::new(0),
            containers: Mutex::new(HashSet::new()),
            blobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Every call that reached the store
    pub fn total_calls(&self) -> usize {
        self.ensure_calls() + self.put_calls()
    }

    pub fn blob(&self, container: &str, key: &str) -> Option<StoredBlob> {
        self.blobs
            .lock()
            .unwrap()
            .get(&format!("{}/{}", container, key))
            .cloned()
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

impl Default for FlakyBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn ensure_container(
        &self,
        container: &str,
        _access: PublicAccess,
    ) -> StorageResult<ContainerStatus> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        if self.containers.lock().unwrap().insert(container.to_string()) {
            Ok(ContainerStatus::Created)
        } else {
            Ok(ContainerStatus::AlreadyExists)
        }
    }

    async fn put_blob(
        &self,
        container: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &BlobMetadata,
    ) -> StorageResult<String> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        let scripted_failure = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure {
            return Err(self.failure.error());
        }

        self.blobs.lock().unwrap().insert(
            format!("{}/{}", container, key),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
                metadata: metadata.clone(),
            },
        );
        Ok(format!("{}/{}/{}", TEST_BLOB_ENDPOINT, container, key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Azure
    }
}
