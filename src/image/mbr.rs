//! Raw disk images with an MBR partition table.
//!
//! MBR layout (first sector):
//! ```text
//! [boot code: 446 bytes]
//! [partition entry 1: 16 bytes]
//! ...
//! [partition entry 4: 16 bytes]
//! [signature: 0x55 0xAA]
//! ```
//!
//! Partition entry:
//! ```text
//! [status: u8]          // 0x80 = bootable
//! [chs_first: 3 bytes]
//! [type: u8]            // 0 = unused
//! [chs_last: 3 bytes]
//! [start_lba: u32 LE]
//! [sectors: u32 LE]
//! ```
//!
//! Images without the signature are treated as a single non-bootable
//! partition covering the whole image, byte for byte.

use super::{DiskImage, Partition};
use crate::error::{Error, Result};
use crate::storage::read_fully;
use bytes::Buf;
use log::debug;
use std::io::{Read, Seek, SeekFrom};

const MBR_SIZE: usize = 512;
const PARTITION_TABLE_OFFSET: usize = 446;
const PARTITION_ENTRY_SIZE: usize = 16;
const PARTITION_ENTRIES: usize = 4;
const SIGNATURE: [u8; 2] = [0x55, 0xAA];
const BOOTABLE_FLAG: u8 = 0x80;

/// MbrImage walks the primary partitions of a raw disk image.
pub struct MbrImage<R: Read + Seek> {
    source: R,
    sector_size: u64,
    image_len: u64,
    partitions: Vec<Partition>,
    next: usize,
    /// Bytes left in the current partition, `None` before the first partition
    remaining: Option<u64>,
}

impl<R: Read + Seek> MbrImage<R> {
    /// Parse the partition table of `source`
    pub fn new(mut source: R, sector_size: u64) -> Result<Self> {
        if sector_size == 0 {
            return Err(Error::invalid_argument("sector_size must be > 0"));
        }

        let image_len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        let mut mbr = [0u8; MBR_SIZE];
        let n = read_fully(&mut source, &mut mbr)?;

        let mut partitions = if n == MBR_SIZE {
            parse_partition_table(&mbr)
        } else {
            Vec::new()
        };

        if partitions.is_empty() {
            debug!("No MBR partition table found, using the whole image");
            partitions.push(Partition {
                index: 0,
                bootable: false,
                partition_type: 0,
                start_sector: 0,
                sectors: image_len.div_ceil(sector_size),
                byte_len: Some(image_len),
            });
        }

        Ok(Self { source, sector_size, image_len, partitions, next: 0, remaining: None })
    }

    /// All partitions found in the image
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }
}

/// Parse the four primary entries; returns nothing if the signature is missing.
fn parse_partition_table(mbr: &[u8; MBR_SIZE]) -> Vec<Partition> {
    if mbr[MBR_SIZE - 2..] != SIGNATURE {
        return Vec::new();
    }

    let mut partitions = Vec::new();
    for i in 0..PARTITION_ENTRIES {
        let offset = PARTITION_TABLE_OFFSET + i * PARTITION_ENTRY_SIZE;
        let mut entry = &mbr[offset..offset + PARTITION_ENTRY_SIZE];

        let status = entry.get_u8();
        entry.advance(3);
        let partition_type = entry.get_u8();
        entry.advance(3);
        let start_sector = entry.get_u32_le() as u64;
        let sectors = entry.get_u32_le() as u64;

        if partition_type == 0 || sectors == 0 {
            continue;
        }

        partitions.push(Partition {
            index: i,
            bootable: status == BOOTABLE_FLAG,
            partition_type,
            start_sector,
            sectors,
            byte_len: None,
        });
    }
    partitions
}

impl<R: Read + Seek> DiskImage for MbrImage<R> {
    fn next_partition(&mut self) -> Result<Option<Partition>> {
        let partition = match self.partitions.get(self.next) {
            Some(p) => *p,
            None => {
                self.remaining = Some(0);
                return Ok(None);
            }
        };
        self.next += 1;

        let start = partition.start_sector * self.sector_size;
        let end = (start + partition.sectors * self.sector_size).min(self.image_len);
        self.source.seek(SeekFrom::Start(start))?;
        self.remaining = Some(end.saturating_sub(start));

        debug!(
            "Partition {}: start sector {}, {} sectors, bootable {}",
            partition.index, partition.start_sector, partition.sectors, partition.bootable
        );
        Ok(Some(partition))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self
            .remaining
            .ok_or_else(|| Error::invalid_argument("read before next_partition"))?;
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = (buf.len() as u64).min(remaining) as usize;
        let n = self.source.read(&mut buf[..want])?;
        // An image shorter than its partition table claims ends the partition early
        self.remaining = Some(if n == 0 { 0 } else { remaining - n as u64 });
        Ok(n)
    }
}
