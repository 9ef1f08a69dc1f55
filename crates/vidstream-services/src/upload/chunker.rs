use vidstream_core::models::Chunk;
use vidstream_core::UploadError;

/// Split `file_size` bytes into contiguous chunks of `chunk_size` bytes.
///
/// Every chunk but the last is exactly `chunk_size`; the last is never empty.
/// A zero-byte file yields no chunks.
pub fn plan_chunks(file_size: u64, chunk_size: u64) -> Result<Vec<Chunk>, UploadError> {
    if chunk_size == 0 {
        return Err(UploadError::InvalidChunkSize);
    }

    let count = file_size.div_ceil(chunk_size);
    let mut chunks = Vec::with_capacity(count as usize);
    let mut offset = 0u64;
    let mut index = 1u32;

    while offset < file_size {
        let size = chunk_size.min(file_size - offset);
        chunks.push(Chunk {
            index,
            offset,
            size,
        });
        offset += size;
        index += 1;
    }

    Ok(chunks)
}
