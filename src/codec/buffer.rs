//! Bounded buffer of pending blocks.

use crate::error::{Error, Result};
use crate::format::CHUNK_BLOCKS;
use bytes::{BufMut, BytesMut};

/// ChunkBuffer holds up to `CHUNK_BLOCKS` blocks awaiting classification.
///
/// The buffer only knows about block boundaries; it does not look at block
/// contents.
#[derive(Debug)]
pub struct ChunkBuffer {
    block_size: usize,
    data: BytesMut,
}

impl ChunkBuffer {
    /// Create an empty buffer for blocks of `block_size` bytes
    pub fn new(block_size: usize) -> Self {
        Self { block_size, data: BytesMut::with_capacity(block_size * CHUNK_BLOCKS) }
    }

    /// Append one block.
    ///
    /// The caller must have validated the block length; a full buffer or a
    /// mis-sized block means the codec lost track of its state.
    pub fn push(&mut self, block: &[u8]) -> Result<()> {
        if block.len() != self.block_size {
            return Err(Error::corrupt_state(format!(
                "Block of {} bytes pushed into buffer of {}-byte blocks",
                block.len(),
                self.block_size
            )));
        }
        if self.is_complete() {
            return Err(Error::corrupt_state("Chunk buffer is already full"));
        }

        self.data.put_slice(block);
        Ok(())
    }

    /// Append zero blocks until the chunk is complete
    pub fn pad_with_zeros(&mut self) {
        let target = self.block_size * CHUNK_BLOCKS;
        if self.data.len() < target {
            self.data.put_bytes(0, target - self.data.len());
        }
    }

    /// Whether the buffer holds exactly one full chunk
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.block_size * CHUNK_BLOCKS
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of buffered blocks
    pub fn block_count(&self) -> usize {
        self.data.len() / self.block_size
    }

    /// Number of buffered bytes
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Size of one block
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Iterate the buffered blocks in arrival order
    pub fn blocks(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.block_size)
    }

    /// Drop all buffered blocks
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
