//! Vidstream Storage Library
//!
//! This crate provides the multipart upload boundary used by the upload
//! coordinator: the `MultipartStorage` trait and implementations for S3 and the
//! local filesystem.
//!
//! # Storage key format
//!
//! Uploaded videos are stored under `videos/{file_name}`. Keys must not contain
//! `..` or a leading `/`. Key generation is centralized in the `keys` module so
//! all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{check_part_sequence, MultipartStorage, StorageError, StorageResult};
pub use vidstream_core::StorageBackend;
