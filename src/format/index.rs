//! Zero-block index implementation.
//!
//! The index holds one node per chunk of `CHUNK_BLOCKS` logical blocks. Each
//! node carries a bitmap of the chunk's zero blocks and the number of zero
//! blocks in all earlier chunks, so the payload offset of any block can be
//! computed without scanning the index.

use crate::error::{Error, Result};
use crate::format::{CHUNK_BLOCKS, INDEX_NODE_SIZE};
use crate::storage::write_fully;
use bytes::{Buf, BufMut, BytesMut};
use std::io::{ErrorKind, Read, Write};

/// IndexNode describes one chunk of 8 logical blocks.
///
/// Format:
/// ```text
/// [zero_count_before: 8 bytes]
/// [bitmap: 1 byte]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexNode {
    /// Number of zero blocks in all preceding chunks
    pub zero_count_before: u64,
    /// Bit `i` set means block `i` of this chunk is all-zero
    pub bitmap: u8,
}

impl IndexNode {
    /// Create a new IndexNode
    pub fn new(zero_count_before: u64, bitmap: u8) -> Self {
        Self { zero_count_before, bitmap }
    }

    /// Whether block `slot` (0..8) of this chunk is a zero block
    pub fn is_zero(&self, slot: usize) -> bool {
        debug_assert!(slot < CHUNK_BLOCKS);
        self.bitmap & (1 << slot) != 0
    }

    /// Number of zero blocks in this chunk
    pub fn zero_count(&self) -> u64 {
        self.bitmap.count_ones() as u64
    }

    /// Encode the node to bytes (9 bytes)
    pub fn encode(&self) -> [u8; INDEX_NODE_SIZE] {
        let mut buf = [0u8; INDEX_NODE_SIZE];
        let mut cursor = &mut buf[..];
        cursor.put_u64(self.zero_count_before);
        cursor.put_u8(self.bitmap);
        buf
    }

    /// Decode a node from bytes
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() < INDEX_NODE_SIZE {
            return Err(Error::format(format!(
                "Index node too short: expected {}, got {}",
                INDEX_NODE_SIZE,
                data.len()
            )));
        }

        let zero_count_before = data.get_u64();
        let bitmap = data.get_u8();

        Ok(Self { zero_count_before, bitmap })
    }
}

/// Where the bytes of a logical block live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLocation {
    /// The block is all-zero and has no payload bytes.
    Zero,
    /// The block is stored at this byte offset of the payload region.
    Payload {
        /// Byte offset from the start of the file
        offset: u64,
    },
}

/// The ordered sequence of index nodes of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    nodes: Vec<IndexNode>,
}

impl Index {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node for the next chunk
    pub fn push(&mut self, node: IndexNode) {
        self.nodes.push(node);
    }

    /// Get the node for chunk `chunk`
    pub fn get(&self, chunk: usize) -> Option<&IndexNode> {
        self.nodes.get(chunk)
    }

    /// Get all nodes in chunk order
    pub fn nodes(&self) -> &[IndexNode] {
        &self.nodes
    }

    /// Get the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of logical blocks covered, including trailing padding
    pub fn block_count(&self) -> u64 {
        self.nodes.len() as u64 * CHUNK_BLOCKS as u64
    }

    /// Total number of zero blocks
    pub fn zero_block_count(&self) -> u64 {
        self.nodes.iter().map(IndexNode::zero_count).sum()
    }

    /// Encoded size of the whole index in bytes
    pub fn encoded_len(&self) -> u64 {
        self.nodes.len() as u64 * INDEX_NODE_SIZE as u64
    }

    /// Encode every node, in order, into a single buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.encoded_len() as usize);
        for node in &self.nodes {
            buf.put_slice(&node.encode());
        }
        buf.to_vec()
    }

    /// Write the index to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_fully(writer, &self.encode())
    }

    /// Read `count` nodes from a reader
    pub fn read_from<R: Read>(reader: &mut R, count: u64) -> Result<Self> {
        let len = count
            .checked_mul(INDEX_NODE_SIZE as u64)
            .and_then(|len| usize::try_from(len).ok())
            .ok_or_else(|| Error::format(format!("Index size {} is out of range", count)))?;

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::format("Index truncated"),
            _ => Error::Io(e),
        })?;

        let nodes = buf
            .chunks_exact(INDEX_NODE_SIZE)
            .map(IndexNode::decode)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { nodes })
    }

    /// Check that every node's `zero_count_before` equals the number of zero
    /// blocks in the nodes before it.
    pub fn validate(&self) -> Result<()> {
        let mut zeros = 0u64;
        for (chunk, node) in self.nodes.iter().enumerate() {
            if node.zero_count_before != zeros {
                return Err(Error::format(format!(
                    "Index node {} has zero_count_before {}, expected {}",
                    chunk, node.zero_count_before, zeros
                )));
            }
            zeros += node.zero_count();
        }
        Ok(())
    }

    /// Compute where logical block `block` is stored.
    ///
    /// Returns `None` if the block lies beyond the end of the index.
    pub fn locate(&self, block: u64, block_size: u32) -> Option<BlockLocation> {
        let chunk = usize::try_from(block / CHUNK_BLOCKS as u64).ok()?;
        let slot = (block % CHUNK_BLOCKS as u64) as usize;
        let node = self.nodes.get(chunk)?;

        if node.is_zero(slot) {
            return Some(BlockLocation::Zero);
        }

        let below_mask = (1u16 << slot) as u8 - 1;
        let zeros_before = node.zero_count_before + (node.bitmap & below_mask).count_ones() as u64;
        let offset = (block - zeros_before) * block_size as u64;
        Some(BlockLocation::Payload { offset })
    }
}
