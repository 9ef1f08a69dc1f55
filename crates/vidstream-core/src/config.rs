//! Configuration module
//!
//! Settings for the storage backend, upload limits and the HTTP services used
//! for browsing and playback. Everything is read from the environment (a `.env`
//! file is honored); parsing also works over an arbitrary key lookup so callers
//! can build a `Config` without touching process state.

use std::env;

use crate::storage_types::StorageBackend;

const DEFAULT_BUCKET: &str = "video-upload-demo";
const MAX_VIDEO_SIZE_MB: u64 = 500;
const UPLOAD_CHUNK_SIZE_MB: u64 = 5;
const HTTP_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";
const DEFAULT_QUALITY: &str = "480p";
const DEFAULT_CONTENT_TYPES: &str = "video/mp4,video/avi,video/mov";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub log_format: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Upload configuration
    pub max_video_size_bytes: u64,
    pub video_allowed_content_types: Vec<String>,
    pub upload_chunk_size_bytes: u64,
    pub upload_abort_on_failure: bool,
    // Catalog and playback services
    pub catalog_base_url: String,
    pub streaming_base_url: String,
    pub playback_default_quality: String,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from the process environment and validate it.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from a key lookup and validate it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let max_video_size_mb = var("MAX_VIDEO_SIZE_MB")
            .map(|s| {
                s.parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be a valid number"))
            })
            .transpose()?
            .unwrap_or(MAX_VIDEO_SIZE_MB);

        let chunk_size_mb = var("UPLOAD_CHUNK_SIZE_MB")
            .map(|s| {
                s.parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("UPLOAD_CHUNK_SIZE_MB must be a valid number"))
            })
            .transpose()?
            .unwrap_or(UPLOAD_CHUNK_SIZE_MB);

        let video_allowed_content_types = var("VIDEO_ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPES.to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let upload_abort_on_failure = var("UPLOAD_ABORT_ON_FAILURE")
            .map(|s| {
                s.trim().to_lowercase().parse::<bool>().map_err(|_| {
                    anyhow::anyhow!("UPLOAD_ABORT_ON_FAILURE must be true or false")
                })
            })
            .transpose()?
            .unwrap_or(true);

        let config = Config {
            environment: var("ENVIRONMENT")
                .or_else(|| var("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            log_format: var("LOG_FORMAT")
                .unwrap_or_else(|| "text".to_string())
                .to_lowercase(),
            storage_backend,
            s3_bucket: var("S3_BUCKET_NAME")
                .or_else(|| var("S3_BUCKET"))
                .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_access_key_id: var("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            max_video_size_bytes: mib_to_bytes("MAX_VIDEO_SIZE_MB", max_video_size_mb)?,
            video_allowed_content_types,
            upload_chunk_size_bytes: mib_to_bytes("UPLOAD_CHUNK_SIZE_MB", chunk_size_mb)?,
            upload_abort_on_failure,
            catalog_base_url: var("CATALOG_API_URL")
                .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string()),
            streaming_base_url: var("STREAMING_API_URL")
                .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string()),
            playback_default_quality: var("PLAYBACK_DEFAULT_QUALITY")
                .unwrap_or_else(|| DEFAULT_QUALITY.to_string()),
            http_timeout_secs: var("HTTP_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|&t| t > 0)
                .unwrap_or(HTTP_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.upload_chunk_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_CHUNK_SIZE_MB must be greater than 0"
            ));
        }

        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be greater than 0"));
        }

        if self.video_allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_CONTENT_TYPES must list at least one content type"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.aws_access_key_id.is_none() || self.aws_secret_access_key.is_none() {
                    return Err(anyhow::anyhow!("AWS credentials are not defined"));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Region used for public object URLs; S3-compatible local setups may leave it unset.
    pub fn region_or_default(&self) -> &str {
        self.s3_region.as_deref().unwrap_or("us-east-1")
    }
}

fn mib_to_bytes(key: &str, mib: u64) -> Result<u64, anyhow::Error> {
    mib.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("{} is too large", key))
}
