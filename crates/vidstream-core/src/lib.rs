//! Vidstream Core Library
//!
//! This crate provides the domain models, error types, configuration, and upload
//! validation shared by every vidstream component.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{
    CatalogError, ErrorMetadata, LogLevel, ManifestError, UploadError, ValidationError,
};
pub use storage_types::StorageBackend;
pub use validation::UploadValidator;
