//! Configuration options for writing containers.

use crate::format::{DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE};

/// Default size of a disk sector, used to turn partition sizes into bytes.
pub const DEFAULT_SECTOR_SIZE: u64 = 512;

/// Options controlling how a container is written.
#[derive(Debug, Clone)]
pub struct Options {
    /// Size of one logical block (in bytes).
    /// Default: 4KB
    pub block_size: u32,

    /// Sector size of the source image (in bytes).
    /// Partition sizes are reported in sectors and multiplied by this value
    /// to obtain the logical size of the stream.
    /// Default: 512
    pub sector_size: u64,

    /// Capacity of the write buffer placed in front of file storage.
    /// Default: 64KB
    pub write_buffer_size: usize,

    /// Sync the container file to disk when it is closed.
    /// Default: true
    pub sync_on_close: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            sector_size: DEFAULT_SECTOR_SIZE,
            write_buffer_size: 64 * 1024, // 64KB
            sync_on_close: true,
        }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logical block size.
    pub fn block_size(mut self, size: u32) -> Self {
        self.block_size = size;
        self
    }

    /// Sets the sector size of the source image.
    pub fn sector_size(mut self, size: u64) -> Self {
        self.sector_size = size;
        self
    }

    /// Sets the write buffer capacity.
    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    /// Enables or disables syncing on close.
    pub fn sync_on_close(mut self, value: bool) -> Self {
        self.sync_on_close = value;
        self
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.block_size == 0 {
            return Err(crate::Error::invalid_argument("block_size must be > 0"));
        }
        if self.block_size > MAX_BLOCK_SIZE {
            return Err(crate::Error::invalid_argument(format!(
                "block_size must be <= {}",
                MAX_BLOCK_SIZE
            )));
        }
        if self.sector_size == 0 {
            return Err(crate::Error::invalid_argument("sector_size must be > 0"));
        }
        if self.write_buffer_size == 0 {
            return Err(crate::Error::invalid_argument("write_buffer_size must be > 0"));
        }
        Ok(())
    }
}
