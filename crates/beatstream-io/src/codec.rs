//! Binary frame format of the data channel.
//!
//! One frame carries one block as `2 × block_size` little-endian `f32`
//! samples, all left-channel samples first, then all right-channel samples:
//!
//! ```text
//! | L[0] L[1] ... L[N-1] | R[0] R[1] ... R[N-1] |
//! ```

use beatstream_core::AudioBlock;

use crate::{Error, Result};

const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

/// Byte length of a frame for the given block size.
pub const fn frame_len(block_size: usize) -> usize {
    2 * block_size * SAMPLE_BYTES
}

/// Serialize a block into one binary frame.
pub fn encode_block(block: &AudioBlock) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame_len(block.len()));
    for sample in block.left().iter().chain(block.right()) {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// Parse a binary frame back into a block.
///
/// Fails when the payload does not split into two equal channels of whole samples.
pub fn decode_frame(bytes: &[u8]) -> Result<AudioBlock> {
    if bytes.len() % (2 * SAMPLE_BYTES) != 0 {
        return Err(Error::Frame { len: bytes.len() });
    }
    let mut left: Vec<f32> = bytes
        .chunks_exact(SAMPLE_BYTES)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let right = left.split_off(left.len() / 2);
    AudioBlock::from_channels(left, right).ok_or(Error::Frame { len: bytes.len() })
}
