use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Destination object of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub bucket: String,
    pub key: String,
}

impl UploadTarget {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// Byte range of the source file uploaded as one storage part.
///
/// `index` is 1-based and doubles as the storage part number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: u32,
    pub offset: u64,
    pub size: u64,
}

impl Chunk {
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    pub fn range(&self) -> Range<u64> {
        self.offset..self.end()
    }
}

/// Storage acknowledgement for one uploaded part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartResult {
    pub part_number: u32,
    /// Opaque tag (the ETag on S3) required verbatim at completion.
    pub integrity_tag: String,
}

/// Progress published after each completed part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    /// 0-100, rounded half up.
    pub percent: u8,
    pub completed_parts: u32,
    pub total_parts: u32,
    pub status: String,
}

impl UploadProgress {
    pub fn after_part(completed_parts: u32, total_parts: u32) -> Self {
        Self {
            percent: percent_complete(completed_parts, total_parts),
            completed_parts,
            total_parts,
            status: format!("Uploaded chunk {} of {}", completed_parts, total_parts),
        }
    }
}

/// Integer percentage of `completed / total`, rounded half up.
pub fn percent_complete(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 100;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    ((completed * 200 + total) / (total * 2)) as u8
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub target: UploadTarget,
    pub upload_id: String,
    pub parts: u32,
    pub bytes: u64,
    pub url: String,
    pub message: String,
    pub completed_at: DateTime<Utc>,
}
