//! # blockcompress - Sparse-Block Containers for Disk Images
//!
//! blockcompress rewrites a stream of fixed-size blocks into a compact
//! container that leaves out every all-zero block. The positions of the
//! dropped blocks are kept in a bitmap index, so the original stream can be
//! rebuilt byte for byte.
//!
//! ## Architecture
//!
//! - **Chunk Codec** ([`codec`]): groups blocks into chunks of 8, detects zero
//!   blocks and produces one bitmap node per chunk
//! - **Container Format** ([`format`], [`container`]): payload, then index,
//!   then a fixed 32-byte header at the very end of the file
//! - **Disk Images** ([`image`]): partition sources feeding the writer
//! - **Pipeline** ([`pack`]): partition → container and container → stream
//!
//! ## Example Usage
//!
//! ```rust
//! use blockcompress::{ContainerReader, ContainerWriter};
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), blockcompress::Error> {
//! let mut writer = ContainerWriter::create(Vec::new(), 4, 12)?;
//! writer.write(&[0, 0, 0, 0])?;
//! writer.write(&[0xDE, 0xAD, 0xBE, 0xEF])?;
//! writer.write(&[0, 0, 0, 0])?;
//! let (_header, bytes) = writer.finish()?;
//!
//! let mut reader = ContainerReader::open(Cursor::new(bytes))?;
//! let mut block = [0u8; 4];
//! reader.read(&mut block)?;
//! assert_eq!(block, [0, 0, 0, 0]);
//! reader.read(&mut block)?;
//! assert_eq!(block, [0xDE, 0xAD, 0xBE, 0xEF]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod format;
pub mod image;
pub mod pack;
mod storage;

// Re-exports
pub use config::Options;
pub use container::{BlockKind, ContainerReader, ContainerWriter};
pub use error::{Error, Result};
pub use format::{CoreHeader, Index, IndexNode};
