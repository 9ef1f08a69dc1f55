//! Error types module
//!
//! One error enum per boundary: upload validation, the upload workflow itself,
//! the video catalog and the playback manifest service. Each of them describes
//! how it should be presented through [`ErrorMetadata`], so front-ends can render
//! a status line and pick a log level without matching on variants.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error presentation
///
/// Errors self-describe how they are shown to the end user and to operators.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether running the same operation again may succeed
    fn is_recoverable(&self) -> bool;

    /// User-facing status line
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Rejections produced before any storage call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported content type: {content_type} (accepted: {accepted:?})")]
    UnsupportedType {
        content_type: String,
        accepted: Vec<String>,
    },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),
}

/// Terminal failure of one chunked upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Chunk size must be greater than 0")]
    InvalidChunkSize,

    #[error("File is empty, nothing to upload")]
    NothingToUpload,

    #[error("Failed to initiate multipart upload: {0}")]
    Initiation(String),

    #[error("Failed to upload part {index}: {reason}")]
    PartUpload { index: u32, reason: String },

    #[error("Failed to complete multipart upload: {0}")]
    Completion(String),
}

/// Failure to fetch the video catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Transport(String),

    #[error("Catalog returned status {0}")]
    Status(u16),

    #[error("Catalog response could not be decoded: {0}")]
    Decode(String),
}

/// Failure to resolve a playback manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Manifest request failed: {0}")]
    Transport(String),

    #[error("Manifest service returned status {0}")]
    Status(u16),

    #[error("Manifest response could not be decoded: {0}")]
    Decode(String),

    #[error("Quality {0} not found in manifest")]
    MissingQuality(String),
}

impl ErrorMetadata for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedType { .. } => "UNSUPPORTED_TYPE",
            ValidationError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ValidationError::InvalidFileName(_) => "INVALID_FILE_NAME",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn client_message(&self) -> String {
        match self {
            ValidationError::UnsupportedType { .. } => {
                "Unsupported file type. Please upload a video.".to_string()
            }
            ValidationError::FileTooLarge { max, .. } => format!(
                "File exceeds the maximum allowed size of {} MB.",
                max / 1024 / 1024
            ),
            ValidationError::InvalidFileName(_) => "Invalid file name.".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::Validation(inner) => inner.error_code(),
            UploadError::InvalidChunkSize => "INVALID_CHUNK_SIZE",
            UploadError::NothingToUpload => "NOTHING_TO_UPLOAD",
            UploadError::Initiation(_) => "INITIATION_ERROR",
            UploadError::PartUpload { .. } => "PART_UPLOAD_ERROR",
            UploadError::Completion(_) => "COMPLETION_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UploadError::Initiation(_) | UploadError::PartUpload { .. } | UploadError::Completion(_)
        )
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::Validation(inner) => inner.client_message(),
            UploadError::InvalidChunkSize => "Invalid chunk size configured.".to_string(),
            UploadError::NothingToUpload => "The selected file is empty.".to_string(),
            UploadError::Initiation(_) => "Failed to start the multipart upload.".to_string(),
            UploadError::PartUpload { index, .. } => format!("Failed to upload chunk {}.", index),
            UploadError::Completion(_) => "Failed to finalize the upload.".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::Validation(_) | UploadError::NothingToUpload => LogLevel::Debug,
            UploadError::InvalidChunkSize => LogLevel::Warn,
            UploadError::Initiation(_)
            | UploadError::PartUpload { .. }
            | UploadError::Completion(_) => LogLevel::Error,
        }
    }
}

impl ErrorMetadata for CatalogError {
    fn error_code(&self) -> &'static str {
        match self {
            CatalogError::Transport(_) => "CATALOG_UNREACHABLE",
            CatalogError::Status(_) => "CATALOG_STATUS",
            CatalogError::Decode(_) => "CATALOG_DECODE",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, CatalogError::Decode(_))
    }

    fn client_message(&self) -> String {
        "No videos available.".to_string()
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Error
    }
}

impl ErrorMetadata for ManifestError {
    fn error_code(&self) -> &'static str {
        match self {
            ManifestError::Transport(_) => "MANIFEST_UNREACHABLE",
            ManifestError::Status(_) => "MANIFEST_STATUS",
            ManifestError::Decode(_) => "MANIFEST_DECODE",
            ManifestError::MissingQuality(_) => "QUALITY_NOT_FOUND",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, ManifestError::Transport(_) | ManifestError::Status(_))
    }

    fn client_message(&self) -> String {
        "Playback is unavailable for this video.".to_string()
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ManifestError::MissingQuality(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
