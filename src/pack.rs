//! Packing pipeline: disk image partitions in, containers out, and back.

use crate::config::Options;
use crate::container::{ContainerReader, ContainerWriter};
use crate::error::Result;
use crate::format::{CoreHeader, CONTAINER_EXTENSION};
use crate::image::{DiskImage, Partition};
use crate::storage::write_fully;
use log::{info, warn};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

/// A container produced from one partition.
#[derive(Debug, Clone)]
pub struct PackedPartition {
    /// The source partition
    pub partition: Partition,
    /// Where the container was written
    pub path: PathBuf,
    /// The header written at close
    pub header: CoreHeader,
}

/// Feed the current partition of `image` into `writer`, one block at a time.
///
/// A short final read is padded with zeros to a full block. Returns the
/// number of blocks written. The writer is left open for the caller to close.
pub fn pack_partition<D, W>(image: &mut D, writer: &mut ContainerWriter<W>) -> Result<u64>
where
    D: DiskImage + ?Sized,
    W: Write,
{
    let mut block = vec![0u8; writer.block_size()];
    let mut blocks = 0u64;

    loop {
        let filled = fill_block(image, &mut block)?;
        if filled == 0 {
            break;
        }
        block[filled..].fill(0);
        writer.write(&block)?;
        blocks += 1;

        if filled < block.len() {
            break;
        }
    }
    Ok(blocks)
}

/// Read from `image` until `block` is full or the partition ends
fn fill_block<D: DiskImage + ?Sized>(image: &mut D, block: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        let n = image.read(&mut block[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Write one container per non-bootable partition of `image` into `out_dir`.
///
/// Containers are named `<stem>.<partition>.gbcm`; the logical size of each
/// is the partition's byte length for `options.sector_size`.
pub fn pack_image<D, P>(
    image: &mut D,
    out_dir: P,
    stem: &str,
    options: &Options,
) -> Result<Vec<PackedPartition>>
where
    D: DiskImage + ?Sized,
    P: AsRef<Path>,
{
    options.validate()?;

    let mut packed = Vec::new();
    while let Some(partition) = image.next_partition()? {
        if partition.is_bootable() {
            info!("Skipping bootable partition {}", partition.name());
            continue;
        }

        let path = out_dir
            .as_ref()
            .join(format!("{}.{}.{}", stem, partition.name(), CONTAINER_EXTENSION));
        let logical_size = partition.len_bytes(options.sector_size);

        let mut writer = ContainerWriter::create_file(&path, logical_size, options)?;
        let blocks = pack_partition(image, &mut writer)?;
        let header = writer.close_file(options.sync_on_close)?;

        info!(
            "Packed partition {} into {} ({} blocks, {} payload bytes)",
            partition.name(),
            path.display(),
            blocks,
            header.payload_size
        );
        packed.push(PackedPartition { partition, path, header });
    }

    Ok(packed)
}

/// Restore the original stream of a container into `out`.
///
/// Writes exactly `logical_size` bytes unless the container runs out of
/// blocks first; trailing padding is dropped. Returns the bytes written.
pub fn unpack<R, W>(reader: &mut ContainerReader<R>, out: &mut W) -> Result<u64>
where
    R: Read + Seek,
    W: Write + ?Sized,
{
    let logical_size = reader.header().logical_size;
    let mut block = vec![0u8; reader.block_size()];
    let mut written = 0u64;

    while written < logical_size {
        if reader.read(&mut block)?.is_none() {
            warn!("Container ended after {} of {} logical bytes", written, logical_size);
            break;
        }
        let take = (logical_size - written).min(block.len() as u64) as usize;
        write_fully(out, &block[..take])?;
        written += take as u64;
    }

    out.flush()?;
    Ok(written)
}
