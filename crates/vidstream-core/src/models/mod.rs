//! Data models for the application
//!
//! `upload` holds the chunked multipart upload types, `video` the catalog and
//! playback types consumed from the HTTP services.

mod upload;
mod video;

pub use upload::*;
pub use video::*;
