//! Chunk encoder: turns a stream of blocks into payload bytes and index nodes.

use super::buffer::ChunkBuffer;
use super::is_zero_block;
use crate::error::{Error, Result};
use crate::format::{Index, IndexNode, CHUNK_BLOCKS};
use crate::storage::write_fully;
use std::io::Write;

/// ChunkEncoder classifies blocks and produces one index node per chunk.
///
/// Payload bytes go to a sink supplied on every call, so the encoder never
/// owns storage.
///
/// Usage:
/// ```
/// use blockcompress::codec::ChunkEncoder;
///
/// let mut payload = Vec::new();
/// let mut encoder = ChunkEncoder::new(4);
/// encoder.submit(&[0, 0, 0, 0], &mut payload).unwrap();
/// encoder.submit(&[0xDE, 0xAD, 0xBE, 0xEF], &mut payload).unwrap();
/// encoder.finalize(&mut payload).unwrap();
///
/// assert_eq!(payload, vec![0xDE, 0xAD, 0xBE, 0xEF]);
/// assert_eq!(encoder.index().len(), 1);
/// ```
#[derive(Debug)]
pub struct ChunkEncoder {
    buffer: ChunkBuffer,
    index: Index,
    zero_total: u64,
    payload_size: u64,
    blocks_submitted: u64,
    finalized: bool,
    /// Set when a chunk flush failed after part of it may have reached the sink
    failed: bool,
}

impl ChunkEncoder {
    /// Create an encoder for blocks of `block_size` bytes
    pub fn new(block_size: usize) -> Self {
        Self {
            buffer: ChunkBuffer::new(block_size),
            index: Index::new(),
            zero_total: 0,
            payload_size: 0,
            blocks_submitted: 0,
            finalized: false,
            failed: false,
        }
    }

    /// Submit one block.
    ///
    /// Fails with `InvalidBlockSize` before touching any state if the block
    /// has the wrong length. Completing a chunk flushes it to `sink`.
    pub fn submit<W: Write + ?Sized>(&mut self, block: &[u8], sink: &mut W) -> Result<()> {
        if block.len() != self.buffer.block_size() {
            return Err(Error::invalid_block_size(self.buffer.block_size(), block.len()));
        }
        if self.failed {
            return Err(Self::failed_error());
        }
        if self.finalized {
            return Err(Error::corrupt_state("Block submitted after finalize"));
        }

        self.buffer.push(block)?;
        self.blocks_submitted += 1;

        if self.buffer.is_complete() {
            self.flush_chunk(sink)?;
        }
        Ok(())
    }

    /// Classify the buffered chunk, write its non-zero blocks and record its node.
    ///
    /// Returns the number of payload bytes written. A sink error leaves the
    /// payload in an unknown state; every later call then fails with
    /// `CorruptState`.
    pub fn flush_chunk<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64> {
        if self.failed {
            return Err(Self::failed_error());
        }
        let block_size = self.buffer.block_size();
        if self.buffer.byte_len() != block_size * CHUNK_BLOCKS {
            return Err(Error::corrupt_state(format!(
                "Invalid chunk size {} bytes, expected {}",
                self.buffer.byte_len(),
                block_size * CHUNK_BLOCKS
            )));
        }

        let mut bitmap = 0u8;
        let mut written = 0u64;
        for (slot, block) in self.buffer.blocks().enumerate() {
            if is_zero_block(block) {
                bitmap |= 1 << slot;
                continue;
            }
            if let Err(e) = write_fully(sink, block) {
                self.failed = true;
                return Err(e);
            }
            written += block.len() as u64;
        }

        self.index.push(IndexNode::new(self.zero_total, bitmap));
        self.zero_total += bitmap.count_ones() as u64;
        self.payload_size += written;
        self.buffer.clear();

        Ok(written)
    }

    /// Flush a trailing partial chunk, padded with zero blocks.
    ///
    /// Only the first call has an effect. An empty buffer adds no node.
    /// Fails with `CorruptState` if an earlier chunk flush failed.
    pub fn finalize<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<()> {
        if self.failed {
            return Err(Self::failed_error());
        }
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;

        if self.buffer.is_empty() {
            return Ok(());
        }

        let padding = CHUNK_BLOCKS - self.buffer.block_count();
        log::debug!("Padding final chunk with {} zero blocks", padding);
        self.buffer.pad_with_zeros();
        self.flush_chunk(sink)?;
        Ok(())
    }

    /// The index built so far
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Bytes written to the payload so far
    pub fn payload_size(&self) -> u64 {
        self.payload_size
    }

    /// Zero blocks seen in flushed chunks, padding included
    pub fn zero_block_count(&self) -> u64 {
        self.zero_total
    }

    /// Blocks accepted by `submit`, excluding padding
    pub fn blocks_submitted(&self) -> u64 {
        self.blocks_submitted
    }

    /// Blocks waiting in the chunk buffer
    pub fn pending_blocks(&self) -> usize {
        self.buffer.block_count()
    }

    /// Whether `finalize` has run
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Whether a chunk flush failed part way
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn failed_error() -> Error {
        Error::corrupt_state("Payload is incomplete after a failed chunk flush")
    }
}
