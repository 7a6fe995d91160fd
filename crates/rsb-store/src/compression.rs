//! Zstandard frame handling for stored blobs.
//!
//! Blobs are either stored verbatim or as a single zstd frame. A frame that
//! declares its content size is decompressed in one shot into a buffer of
//! exactly that size; otherwise it is streamed in [`STREAM_CHUNK`] pieces.
//! A declared size that cannot be allocated is a [`CodecError::BadHeader`].

use std::io::Read;

use tracing::trace;

use crate::error::{CodecError, CodecResult};

/// Leading bytes of every zstd frame.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Read size for frames of unknown content size.
pub const STREAM_CHUNK: usize = 64 * 1024;

/// Returns `true` if `data` starts with the zstd frame magic.
pub fn is_zstd_frame(data: &[u8]) -> bool {
    data.len() >= ZSTD_MAGIC.len() && data[..ZSTD_MAGIC.len()] == ZSTD_MAGIC
}

/// Content size declared in the frame header, or `None` if unknown.
pub fn frame_content_size(data: &[u8]) -> CodecResult<Option<u64>> {
    zstd::zstd_safe::get_frame_content_size(data)
        .map_err(|_| CodecError::BadHeader("frame header unreadable".into()))
}

/// Decompress a blob if it is a zstd frame; otherwise return it unchanged.
pub fn maybe_decompress(data: Vec<u8>) -> CodecResult<Vec<u8>> {
    if is_zstd_frame(&data) {
        decompress_frame(&data)
    } else {
        Ok(data)
    }
}

/// Decompress one zstd frame.
pub fn decompress_frame(data: &[u8]) -> CodecResult<Vec<u8>> {
    match frame_content_size(data)? {
        Some(declared) => decompress_known(data, declared),
        None => decompress_streaming(data),
    }
}

fn decompress_known(data: &[u8], declared: u64) -> CodecResult<Vec<u8>> {
    let capacity = usize::try_from(declared)
        .map_err(|_| CodecError::BadHeader(format!("content size {declared} too large")))?;
    trace!(declared, "one-shot decompression");

    let mut out = Vec::new();
    out.try_reserve_exact(capacity).map_err(|_| {
        CodecError::BadHeader(format!("cannot allocate declared content size {declared}"))
    })?;
    zstd::bulk::Decompressor::new()
        .and_then(|mut d| d.decompress_to_buffer(data, &mut out))
        .map_err(|e| CodecError::Corrupt(e.to_string()))?;
    if out.len() != capacity {
        return Err(CodecError::SizeMismatch {
            declared,
            actual: out.len(),
        });
    }
    Ok(out)
}

fn decompress_streaming(data: &[u8]) -> CodecResult<Vec<u8>> {
    trace!(compressed = data.len(), "streaming decompression");
    let mut decoder =
        zstd::stream::read::Decoder::new(data).map_err(|e| CodecError::Corrupt(e.to_string()))?;

    let mut out = Vec::new();
    let mut chunk = vec![0u8; STREAM_CHUNK];
    loop {
        let n = decoder
            .read(&mut chunk)
            .map_err(|e| CodecError::Corrupt(e.to_string()))?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    Ok(out)
}
