//! Upload validation
//!
//! Checks a file's declared content type, size and name before any storage
//! call is made. Validation has no side effects.

use crate::config::Config;
use crate::error::ValidationError;

/// Validator for video uploads
pub struct UploadValidator {
    max_file_size: u64,
    accepted_content_types: Vec<String>,
}

impl UploadValidator {
    pub fn new(max_file_size: u64, accepted_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            accepted_content_types: accepted_content_types
                .into_iter()
                .map(|ct| ct.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_video_size_bytes,
            config.video_allowed_content_types.clone(),
        )
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn accepted_content_types(&self) -> &[String] {
        &self.accepted_content_types
    }

    /// Validate a file's declared type and size.
    ///
    /// The type is checked first, so an unsupported type is reported regardless of size.
    pub fn validate(&self, content_type: &str, size: u64) -> Result<(), ValidationError> {
        self.validate_content_type(content_type)?;
        self.validate_file_size(size)
    }

    /// Validate content type, ignoring parameters such as `; codecs=...`
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if !self.accepted_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::UnsupportedType {
                content_type: content_type.to_string(),
                accepted: self.accepted_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate file size; a file of exactly the maximum size is accepted.
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate that a file name can become an object key segment.
    pub fn validate_file_name(&self, file_name: &str) -> Result<(), ValidationError> {
        if file_name.trim().is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name == "."
            || file_name == ".."
        {
            return Err(ValidationError::InvalidFileName(file_name.to_string()));
        }

        Ok(())
    }
}
