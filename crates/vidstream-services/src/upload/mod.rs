//! Chunked multipart upload
//!
//! A file is validated, split into fixed-size chunks and sent to storage one
//! part at a time; the upload is committed once every part is acknowledged.

mod chunker;
mod coordinator;
mod progress;
mod source;

pub use chunker::plan_chunks;
pub use coordinator::{ChunkedUploadCoordinator, SUCCESS_MESSAGE};
pub use progress::{NoOpProgress, ProgressSink};
pub use source::{content_type_for_path, FileSource, MemorySource, UploadSource};
