//! # Clip Container Module
//!
//! Locates the raw PCM payload inside a recorded clip. Clips arrive as
//! RIFF/WAVE buffers: a 12-byte preamble followed by a sequence of chunks,
//! each a 4-byte ASCII tag and a 4-byte little-endian length ahead of the
//! payload bytes.
//!
//! Parsing is tolerant by design. Recorders occasionally declare a `data`
//! length past the end of the buffer (the header is written before the final
//! flush); the payload is clamped to the available bytes instead of being
//! rejected.

use crate::error::TunerError;

/// Fixed size of the container header: 12-byte preamble plus the canonical
/// `fmt ` chunk. Anything smaller cannot hold a payload.
pub const HEADER_SIZE: usize = 44;

/// Byte offset of the first chunk after the RIFF/WAVE preamble.
const FIRST_CHUNK_OFFSET: usize = 12;

/// Extracts the PCM payload from a clip buffer.
///
/// Scans the chunk sequence for the `data` tag and returns its payload as a
/// slice borrowed from `clip`. A missing `data` chunk is a normal outcome
/// (`Ok(None)`); the caller skips that cycle. Only a buffer too small to
/// hold the fixed header fails.
///
/// # Errors
/// * `TunerError::InvalidContainer` if `clip` is shorter than [`HEADER_SIZE`].
pub fn extract_pcm(clip: &[u8]) -> Result<Option<&[u8]>, TunerError> {
    // Strictly-less: a clip of exactly HEADER_SIZE bytes still holds a
    // complete header with an empty payload and is scanned normally.
    if clip.len() < HEADER_SIZE {
        return Err(TunerError::InvalidContainer(clip.len()));
    }

    let mut offset = FIRST_CHUNK_OFFSET;
    while offset + 8 <= clip.len() {
        let tag = &clip[offset..offset + 4];
        let declared = u32::from_le_bytes([
            clip[offset + 4],
            clip[offset + 5],
            clip[offset + 6],
            clip[offset + 7],
        ]) as usize;

        if tag == b"data" {
            let start = offset + 8;
            // Clamp a declared length that overruns the buffer.
            let end = start.saturating_add(declared).min(clip.len());
            return Ok(Some(&clip[start..end]));
        }

        offset += 8 + declared;
    }

    Ok(None)
}
