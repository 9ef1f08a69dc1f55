//! Storage abstraction trait
//!
//! This module defines the multipart upload boundary that all storage backends
//! must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use vidstream_core::models::{PartResult, UploadTarget};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Multipart upload not found: {0}")]
    UploadNotFound(String),

    #[error("Invalid part list: {0}")]
    InvalidParts(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Multipart upload abstraction
///
/// An upload is created once, receives parts numbered from 1, and is committed
/// by listing every part with the integrity tag storage returned for it.
#[async_trait]
pub trait MultipartStorage: Send + Sync {
    /// Start a multipart upload and return its upload id
    async fn create_multipart_upload(&self, target: &UploadTarget) -> StorageResult<String>;

    /// Upload one part and return its integrity tag
    ///
    /// Re-sending the same part number overwrites the earlier part.
    async fn upload_part(
        &self,
        target: &UploadTarget,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> StorageResult<String>;

    /// Commit the upload from its parts, concatenated in the given order
    ///
    /// `parts` must be non-empty, ascending and contiguous from 1.
    async fn complete_multipart_upload(
        &self,
        target: &UploadTarget,
        upload_id: &str,
        parts: &[PartResult],
    ) -> StorageResult<()>;

    /// Discard an incomplete upload and the parts stored for it
    async fn abort_multipart_upload(&self, target: &UploadTarget, upload_id: &str)
        -> StorageResult<()>;

    /// Bucket this backend writes to
    fn bucket(&self) -> &str;

    /// Public URL of an object
    fn object_url(&self, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Check that parts are numbered 1..=n in ascending order with no gaps.
pub fn check_part_sequence(parts: &[PartResult]) -> StorageResult<()> {
    if parts.is_empty() {
        return Err(StorageError::InvalidParts(
            "at least one part is required".to_string(),
        ));
    }

    for (position, part) in parts.iter().enumerate() {
        let expected = position as u32 + 1;
        if part.part_number != expected {
            return Err(StorageError::InvalidParts(format!(
                "expected part {} at position {}, got part {}",
                expected, position, part.part_number
            )));
        }
        if part.integrity_tag.is_empty() {
            return Err(StorageError::InvalidParts(format!(
                "part {} has an empty integrity tag",
                part.part_number
            )));
        }
    }

    Ok(())
}

/// Reject targets addressed to a bucket the backend does not serve.
pub(crate) fn check_bucket(expected: &str, target: &UploadTarget) -> StorageResult<()> {
    if target.bucket != expected {
        return Err(StorageError::ConfigError(format!(
            "Target bucket {} does not match configured bucket {}",
            target.bucket, expected
        )));
    }
    Ok(())
}
