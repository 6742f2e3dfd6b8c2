//! Chunk codec.
//!
//! Blocks are grouped into chunks of `CHUNK_BLOCKS`. When a chunk is
//! complete every block is classified as zero or non-zero: zero blocks only
//! set a bit in the chunk's bitmap, non-zero blocks are written to the payload
//! sink. Each chunk yields exactly one index node.
//!
//! Buffering ([`ChunkBuffer`]) and classification ([`ChunkEncoder`]) are kept
//! apart so either can be exercised on its own.

pub mod buffer;
pub mod encoder;

pub use buffer::ChunkBuffer;
pub use encoder::ChunkEncoder;

/// Returns true if every byte of `block` is `0x00`.
pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}
