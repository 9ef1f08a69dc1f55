//! Shared key generation for storage backends.
//!
//! Key format: `videos/{file_name}`.

use crate::traits::{StorageError, StorageResult};

const VIDEO_PREFIX: &str = "videos";

/// Generate the storage key for an uploaded video file.
///
/// The key depends only on the file name, so re-uploading the same file name
/// targets the same object.
pub fn video_key(file_name: &str) -> String {
    format!("{}/{}", VIDEO_PREFIX, file_name)
}

/// Reject keys that are empty, absolute, or have `.` or `..` segments.
///
/// Dots inside a segment are fine: `videos/trip..final.mp4` is a valid key.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key must be relative".to_string(),
        ));
    }
    if key
        .split('/')
        .any(|segment| segment == ".." || segment == ".")
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains a dot segment".to_string(),
        ));
    }
    Ok(())
}
