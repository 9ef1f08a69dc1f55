use crate::keys::validate_key;
use crate::traits::{
    check_bucket, check_part_sequence, MultipartStorage, StorageError, StorageResult,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::multipart::{MultipartStore, PartId};
use object_store::path::Path;
use object_store::PutPayload;
use vidstream_core::models::{PartResult, UploadTarget};

/// Static credentials for the S3 client
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `credentials` - Static credentials; when absent they are read from the environment
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        credentials: Option<S3Credentials>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(credentials) = credentials {
            builder = builder
                .with_access_key_id(credentials.access_key_id)
                .with_secret_access_key(credentials.secret_access_key);
        }

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    fn location(&self, target: &UploadTarget) -> StorageResult<Path> {
        check_bucket(&self.bucket, target)?;
        validate_key(&target.key)?;
        Ok(Path::from(target.key.clone()))
    }
}

#[async_trait]
impl MultipartStorage for S3Storage {
    async fn create_multipart_upload(&self, target: &UploadTarget) -> StorageResult<String> {
        let location = self.location(target)?;
        let start = std::time::Instant::now();

        let upload_id = self.store.create_multipart(&location).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %target.key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 create multipart upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %target.key,
            upload_id = %upload_id,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 multipart upload created"
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
        let location = self.location(target)?;
        let size = body.len() as u64;
        let start = std::time::Instant::now();

        // object_store numbers parts from 0
        let part_idx = (part_number - 1) as usize;
        let upload_id_owned = upload_id.to_string();

        let part = self
            .store
            .put_part(&location, &upload_id_owned, part_idx, PutPayload::from(body))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %target.key,
                    upload_id = %upload_id,
                    part_number,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload part failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %target.key,
            part_number,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 part uploaded"
        );

        Ok(part.content_id)
    }

    async fn complete_multipart_upload(
        &self,
        target: &UploadTarget,
        upload_id: &str,
        parts: &[PartResult],
    ) -> StorageResult<()> {
        let location = self.location(target)?;
        check_part_sequence(parts)?;
        let start = std::time::Instant::now();

        let part_ids: Vec<PartId> = parts
            .iter()
            .map(|p| PartId {
                content_id: p.integrity_tag.clone(),
            })
            .collect();

        self.store
            .complete_multipart(&location, &upload_id.to_string(), part_ids)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %target.key,
                    upload_id = %upload_id,
                    parts = parts.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 complete multipart upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %target.key,
            parts = parts.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 multipart upload completed"
        );

        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        target: &UploadTarget,
        upload_id: &str,
    ) -> StorageResult<()> {
        let location = self.location(target)?;

        self.store
            .abort_multipart(&location, &upload_id.to_string())
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %target.key,
            upload_id = %upload_id,
            "S3 multipart upload aborted"
        );

        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style URLs under the endpoint
    fn object_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
