//! Disk-image sources.
//!
//! A [`DiskImage`] yields partitions one at a time and then streams the bytes
//! of the current partition. The packing pipeline only relies on this trait;
//! [`MbrImage`] is the implementation used by the command line tool.

pub mod mbr;

pub use mbr::MbrImage;

use crate::error::Result;

/// A partition of a disk image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Position in the partition table (0-based)
    pub index: usize,
    /// Whether the partition is flagged as bootable
    pub bootable: bool,
    /// Partition type byte from the table (0 when the image has no table)
    pub partition_type: u8,
    /// First sector of the partition
    pub start_sector: u64,
    /// Length of the partition in sectors
    pub sectors: u64,
    /// Exact length in bytes when it is not a whole number of sectors
    pub byte_len: Option<u64>,
}

impl Partition {
    /// Whether the partition is flagged as bootable
    pub fn is_bootable(&self) -> bool {
        self.bootable
    }

    /// Length of the partition in sectors
    pub fn size(&self) -> u64 {
        self.sectors
    }

    /// Length of the partition in bytes for the given sector size
    pub fn len_bytes(&self, sector_size: u64) -> u64 {
        self.byte_len.unwrap_or(self.sectors * sector_size)
    }

    /// Short name used to label output files
    pub fn name(&self) -> String {
        format!("p{}", self.index)
    }
}

/// A sequential source of partitions and their bytes.
pub trait DiskImage {
    /// Advance to the next partition, or `None` when there are no more.
    fn next_partition(&mut self) -> Result<Option<Partition>>;

    /// Read bytes of the current partition into `buf`.
    ///
    /// Returns `0` at the end of the partition.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_accessors() {
        let partition = Partition {
            index: 2,
            bootable: true,
            partition_type: 0x83,
            start_sector: 2048,
            sectors: 4096,
            byte_len: None,
        };

        assert!(partition.is_bootable());
        assert_eq!(partition.size(), 4096);
        assert_eq!(partition.len_bytes(512), 4096 * 512);
        assert_eq!(partition.name(), "p2");
    }

    #[test]
    fn test_partition_exact_byte_len() {
        let partition = Partition {
            index: 0,
            bootable: false,
            partition_type: 0,
            start_sector: 0,
            sectors: 2,
            byte_len: Some(1000),
        };
        assert_eq!(partition.len_bytes(512), 1000);
    }
}
