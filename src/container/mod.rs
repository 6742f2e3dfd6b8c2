//! Container create/open/close lifecycle around the chunk codec.
//!
//! A [`ContainerWriter`] owns its storage from `create` until `close`,
//! feeding blocks through the chunk encoder and persisting the index and
//! header only when closed. A [`ContainerReader`] parses the trailer, loads
//! the index and then streams blocks back in order.
//!
//! Both sides are strictly sequential; neither supports seeking within the
//! logical stream.

pub mod reader;
pub mod writer;

pub use reader::{read_index, read_trailer, rewind, Blocks, ContainerReader};
pub use writer::ContainerWriter;

/// What a successful block read produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// The block is all-zero; the caller's buffer was zero-filled.
    Zero,
    /// The block was read from the payload region.
    Data,
}
