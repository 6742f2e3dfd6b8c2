//! On-disk container format.
//!
//! A container is an append-only file laid out as:
//!
//! ```text
//! [Payload]        // every non-zero block, in logical order, block_size bytes each
//! [Index Node 1]   // one 9-byte node per chunk of 8 blocks
//! ...
//! [Index Node N]
//! [Header: 32B]    // trailer, always the last bytes of the file
//! ```
//!
//! All integers are big-endian.
//!
//! ## Index Node
//!
//! ```text
//! [zero_count_before: u64]  // zero blocks in all preceding chunks
//! [bitmap: u8]              // bit i set => block i of the chunk is all-zero
//! ```
//!
//! ## Header
//!
//! ```text
//! [magic: u32]
//! [block_size: u32]
//! [logical_size: u64]
//! [index_size: u64]
//! [payload_size: u64]
//! ```
//!
//! The header sits at the end so the writer never has to seek back; readers
//! find it at `end - HEADER_SIZE` and walk backwards to the index.

pub mod header;
pub mod index;

pub use header::CoreHeader;
pub use index::{BlockLocation, Index, IndexNode};

/// Magic number identifying a container ("GBCM").
pub const MAGIC: u32 = 0x4742_434D;

/// Number of blocks covered by one index node.
pub const CHUNK_BLOCKS: usize = 8;

/// Header size in bytes (fixed)
pub const HEADER_SIZE: usize = 32;

/// Encoded size of one index node in bytes (fixed)
pub const INDEX_NODE_SIZE: usize = 9;

/// Default block size (4KB)
pub const DEFAULT_BLOCK_SIZE: u32 = 4096;

/// Largest accepted block size; a chunk buffer holds eight of them.
pub const MAX_BLOCK_SIZE: u32 = 16 * 1024 * 1024;

/// File extension used for containers written by the command line tool.
pub const CONTAINER_EXTENSION: &str = "gbcm";
