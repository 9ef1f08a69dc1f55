//! Vidstream Services Library
//!
//! Business services built on top of the storage boundary. Currently this is
//! the chunked multipart upload coordinator and the upload sources it reads.

pub mod upload;

pub use upload::{
    plan_chunks, ChunkedUploadCoordinator, FileSource, MemorySource, NoOpProgress, ProgressSink,
    UploadSource,
};
