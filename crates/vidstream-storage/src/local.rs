use crate::keys::validate_key;
use crate::traits::{
    check_bucket, check_part_sequence, MultipartStorage, StorageError, StorageResult,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;
use vidstream_core::models::{PartResult, UploadTarget};

const STAGING_DIR: &str = ".multipart";
const KEY_FILE: &str = "key";
const ASSEMBLED_FILE: &str = "assembled";
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Local filesystem storage implementation
///
/// Parts are staged under `{base_path}/.multipart/{upload_id}/` and concatenated
/// into `{base_path}/{key}` on completion. The integrity tag of a part is the hex
/// SHA-256 of its body.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    bucket: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/vidstream")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:9000/media")
    /// * `bucket` - Logical bucket name targets must carry
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        bucket: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(base_path.join(STAGING_DIR))
            .await
            .map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    base_path.display(),
                    e
                ))
            })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            bucket,
        })
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        if key.starts_with(STAGING_DIR) {
            return Err(StorageError::InvalidKey(
                "Storage key targets the staging area".to_string(),
            ));
        }
        Ok(self.base_path.join(key))
    }

    /// Staging directory of an upload; the id must be one this backend issued.
    fn staging_dir(&self, upload_id: &str) -> StorageResult<PathBuf> {
        let id = Uuid::parse_str(upload_id)
            .map_err(|_| StorageError::UploadNotFound(upload_id.to_string()))?;
        Ok(self
            .base_path
            .join(STAGING_DIR)
            .join(id.as_hyphenated().to_string()))
    }

    fn part_path(dir: &Path, part_number: u32) -> PathBuf {
        dir.join(format!("{:05}.part", part_number))
    }

    /// Resolve an existing upload and check it was created for `target`
    async fn open_upload(&self, target: &UploadTarget, upload_id: &str) -> StorageResult<PathBuf> {
        check_bucket(&self.bucket, target)?;
        let dir = self.staging_dir(upload_id)?;

        let recorded_key = fs::read_to_string(dir.join(KEY_FILE))
            .await
            .map_err(|_| StorageError::UploadNotFound(upload_id.to_string()))?;

        if recorded_key != target.key {
            return Err(StorageError::UploadNotFound(format!(
                "{} (created for a different key)",
                upload_id
            )));
        }

        Ok(dir)
    }

    fn integrity_tag(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Stream one staged part into `out`, checking its tag on the way.
    /// Returns the number of bytes appended.
    async fn append_part(
        dir: &Path,
        part: &PartResult,
        out: &mut fs::File,
    ) -> StorageResult<u64> {
        let path = Self::part_path(dir, part.part_number);
        let mut file = fs::File::open(&path).await.map_err(|_| {
            StorageError::InvalidParts(format!("part {} was never uploaded", part.part_number))
        })?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut size = 0u64;
        loop {
            let read = file.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
            out.write_all(&buffer[..read]).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to append part {}: {}",
                    part.part_number, e
                ))
            })?;
            size += read as u64;
        }

        if hex::encode(hasher.finalize()) != part.integrity_tag {
            return Err(StorageError::InvalidParts(format!(
                "integrity tag mismatch for part {}",
                part.part_number
            )));
        }
        Ok(size)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MultipartStorage for LocalStorage {
    async fn create_multipart_upload(&self, target: &UploadTarget) -> StorageResult<String> {
        check_bucket(&self.bucket, target)?;
        self.key_to_path(&target.key)?;

        let upload_id = Uuid::new_v4().to_string();
        let dir = self.staging_dir(&upload_id)?;
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(KEY_FILE), target.key.as_bytes()).await?;

        tracing::debug!(
            key = %target.key,
            upload_id = %upload_id,
            "Local multipart upload created"
        );

        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        target: &UploadTarget,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> StorageResult<String> {
        if part_number == 0 {
            return Err(StorageError::InvalidParts(
                "part numbers start at 1".to_string(),
            ));
        }
        let dir = self.open_upload(target, upload_id).await?;
        let path = Self::part_path(&dir, part_number);
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create part {}: {}", path.display(), e))
        })?;
        file.write_all(&body).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write part {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync part {}: {}", path.display(), e))
        })?;

        let tag = Self::integrity_tag(&body);

        tracing::debug!(
            key = %target.key,
            upload_id = %upload_id,
            part_number,
            size_bytes = body.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local part stored"
        );

        Ok(tag)
    }

    async fn complete_multipart_upload(
        &self,
        target: &UploadTarget,
        upload_id: &str,
        parts: &[PartResult],
    ) -> StorageResult<()> {
        let dir = self.open_upload(target, upload_id).await?;
        check_part_sequence(parts)?;
        let final_path = self.key_to_path(&target.key)?;
        let start = std::time::Instant::now();

        // Parts are verified while being appended to a file in the staging
        // directory; the object only replaces the previous one once complete.
        let assembled_path = dir.join(ASSEMBLED_FILE);
        let mut assembled = fs::File::create(&assembled_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                assembled_path.display(),
                e
            ))
        })?;

        let mut size = 0u64;
        for part in parts {
            size += Self::append_part(&dir, part, &mut assembled).await?;
        }
        assembled.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync file {}: {}",
                assembled_path.display(),
                e
            ))
        })?;
        drop(assembled);

        self.ensure_parent_dir(&final_path).await?;
        fs::rename(&assembled_path, &final_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to move upload into {}: {}",
                final_path.display(),
                e
            ))
        })?;

        fs::remove_dir_all(&dir).await?;

        tracing::info!(
            path = %final_path.display(),
            key = %target.key,
            parts = parts.len(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local multipart upload completed"
        );

        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        target: &UploadTarget,
        upload_id: &str,
    ) -> StorageResult<()> {
        let dir = self.open_upload(target, upload_id).await?;
        fs::remove_dir_all(&dir).await?;

        tracing::info!(
            key = %target.key,
            upload_id = %upload_id,
            "Local multipart upload aborted"
        );

        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
