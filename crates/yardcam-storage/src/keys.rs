//! Shared name validation for storage backends.
//!
//! Container names follow the Azure Blob rules so a container that works against the local
//! backend also works in production. Blob names must not contain a `.` or `..` path segment,
//! a backslash, or a leading `/`.

use crate::traits::{StorageError, StorageResult};

const MAX_BLOB_NAME_LEN: usize = 1024;

/// Validate a container name: 3-63 chars of lowercase letters, digits and single hyphens,
/// starting and ending with a letter or digit.
pub fn validate_container_name(name: &str) -> StorageResult<()> {
    let len_ok = (3..=63).contains(&name.len());
    let chars_ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let edges_ok = !name.starts_with('-') && !name.ends_with('-');

    if len_ok && chars_ok && edges_ok && !name.contains("--") {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(format!(
            "Invalid container name: {}",
            name
        )))
    }
}

pub fn validate_blob_name(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.len() > MAX_BLOB_NAME_LEN {
        return Err(StorageError::InvalidKey(
            "Blob name must be between 1 and 1024 characters".to_string(),
        ));
    }
    let traversal = key.split('/').any(|segment| segment == ".." || segment == ".");
    if traversal || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Blob name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
