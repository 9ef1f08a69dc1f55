use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use vidstream_core::models::Chunk;

/// A file to upload: a name, a declared content type, a size and its bytes.
///
/// The content must not change while an upload reads from it.
#[async_trait]
pub trait UploadSource: Send + Sync {
    fn name(&self) -> &str;

    fn content_type(&self) -> &str;

    fn size(&self) -> u64;

    /// Read exactly the bytes covered by `chunk`
    async fn read_chunk(&self, chunk: &Chunk) -> io::Result<Bytes>;
}

/// Content type for a file path, based on its extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("mp4") => "video/mp4",
        Some("avi") => "video/avi",
        Some("mov") => "video/mov",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("m4v") => "video/x-m4v",
        _ => "application/octet-stream",
    }
}

/// File on the local filesystem
pub struct FileSource {
    path: PathBuf,
    name: String,
    content_type: String,
    size: u64,
}

impl FileSource {
    /// Open `path`, inferring the content type from its extension unless
    /// `content_type` overrides it.
    pub async fn open(path: impl Into<PathBuf>, content_type: Option<String>) -> io::Result<Self> {
        let path = path.into();
        let metadata = fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no usable file name", path.display()),
                )
            })?;

        let content_type =
            content_type.unwrap_or_else(|| content_type_for_path(&path).to_string());

        Ok(Self {
            path,
            name,
            content_type,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UploadSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read_chunk(&self, chunk: &Chunk) -> io::Result<Bytes> {
        let mut file = fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(chunk.offset)).await?;

        let mut buffer = vec![0u8; chunk.size as usize];
        file.read_exact(&mut buffer).await?;

        Ok(Bytes::from(buffer))
    }
}

/// In-memory file contents
pub struct MemorySource {
    name: String,
    content_type: String,
    data: Bytes,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

#[async_trait]
impl UploadSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_chunk(&self, chunk: &Chunk) -> io::Result<Bytes> {
        let start = chunk.offset as usize;
        let end = chunk.end() as usize;
        if end > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("chunk {} ends past the end of {}", chunk.index, self.name),
            ));
        }
        Ok(self.data.slice(start..end))
    }
}
