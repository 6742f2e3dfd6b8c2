//! Container reader implementation.
//!
//! Opening a container happens in three steps, each usable on its own:
//!
//! 1. [`read_trailer`] parses the header from the last `HEADER_SIZE` bytes.
//! 2. [`read_index`] steps back `index_size` nodes from the header and loads them.
//! 3. [`rewind`] moves the storage cursor to the start of the payload.

use super::BlockKind;
use crate::error::{Error, Result};
use crate::format::{
    CoreHeader, Index, CHUNK_BLOCKS, HEADER_SIZE, INDEX_NODE_SIZE, MAX_BLOCK_SIZE,
};
use crate::storage::read_fully;
use log::info;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Read and validate the header at the end of `storage`.
///
/// Returns the header together with the total storage length.
pub fn read_trailer<R: Read + Seek>(storage: &mut R) -> Result<(CoreHeader, u64)> {
    let end = storage.seek(SeekFrom::End(0))?;
    if end < HEADER_SIZE as u64 {
        return Err(Error::format(format!("File too small to be a container: {} bytes", end)));
    }

    storage.seek(SeekFrom::Start(end - HEADER_SIZE as u64))?;
    let header = CoreHeader::read_from(storage)?;
    Ok((header, end))
}

/// Load the index that sits immediately before the header.
///
/// `end` is the total storage length returned by [`read_trailer`].
pub fn read_index<R: Read + Seek>(
    storage: &mut R,
    header: &CoreHeader,
    end: u64,
) -> Result<Index> {
    let trailer_start = end.checked_sub(HEADER_SIZE as u64).ok_or_else(|| {
        Error::format(format!("Storage of {} bytes has no room for a header", end))
    })?;
    if header.block_size == 0 || header.block_size > MAX_BLOCK_SIZE {
        return Err(Error::format(format!("Unsupported block size {}", header.block_size)));
    }
    let index_start = header
        .index_size
        .checked_mul(INDEX_NODE_SIZE as u64)
        .and_then(|len| trailer_start.checked_sub(len))
        .ok_or_else(|| {
            Error::format(format!(
                "Index of {} nodes does not fit in {} bytes",
                header.index_size, trailer_start
            ))
        })?;

    // The payload occupies everything before the index
    if index_start != header.payload_size {
        return Err(Error::format(format!(
            "Payload size mismatch: header says {}, index starts at {}",
            header.payload_size, index_start
        )));
    }
    if header.payload_size % header.block_size as u64 != 0 {
        return Err(Error::format(format!(
            "Payload size {} is not a multiple of block size {}",
            header.payload_size, header.block_size
        )));
    }

    storage.seek(SeekFrom::Start(index_start))?;
    let index = Index::read_from(storage, header.index_size)?;
    index.validate()?;

    let data_blocks = index.block_count() - index.zero_block_count();
    if data_blocks != header.payload_block_count() {
        return Err(Error::format(format!(
            "Index describes {} data blocks, payload holds {}",
            data_blocks,
            header.payload_block_count()
        )));
    }

    Ok(index)
}

/// Position `storage` at the start of the payload region
pub fn rewind<R: Seek>(storage: &mut R) -> Result<()> {
    storage.seek(SeekFrom::Start(0))?;
    Ok(())
}

/// ContainerReader streams the logical blocks of a container in order.
///
/// Usage:
/// ```no_run
/// use blockcompress::ContainerReader;
///
/// let mut reader = ContainerReader::open_file("disk.gbcm").unwrap();
/// let mut block = vec![0u8; reader.block_size()];
/// while let Some(kind) = reader.read(&mut block).unwrap() {
///     println!("{:?}", kind);
/// }
/// ```
#[derive(Debug)]
pub struct ContainerReader<R: Read + Seek> {
    storage: R,
    header: CoreHeader,
    index: Index,
    /// Index of the next logical block to read
    cursor: u64,
}

impl<R: Read + Seek> ContainerReader<R> {
    /// Open a container by parsing its trailer and index
    pub fn open(mut storage: R) -> Result<Self> {
        let (header, end) = read_trailer(&mut storage)?;
        let index = read_index(&mut storage, &header, end)?;
        rewind(&mut storage)?;

        Ok(Self { storage, header, index, cursor: 0 })
    }

    /// Read the next logical block into `out`.
    ///
    /// `out` must be exactly `block_size` bytes. Returns `None` once every
    /// chunk of the index has been read, including trailing padding blocks.
    /// Zero blocks are written into `out` as zeros without touching storage.
    pub fn read(&mut self, out: &mut [u8]) -> Result<Option<BlockKind>> {
        let block_size = self.block_size();
        if out.len() != block_size {
            return Err(Error::invalid_block_size(block_size, out.len()));
        }

        let chunk = (self.cursor / CHUNK_BLOCKS as u64) as usize;
        let slot = (self.cursor % CHUNK_BLOCKS as u64) as usize;
        let node = match self.index.get(chunk) {
            Some(node) => *node,
            None => return Ok(None),
        };
        self.cursor += 1;

        if node.is_zero(slot) {
            out.fill(0);
            return Ok(Some(BlockKind::Zero));
        }

        let n = read_fully(&mut self.storage, out)?;
        if n < block_size {
            return Err(Error::ShortRead { expected: block_size, actual: n });
        }
        Ok(Some(BlockKind::Data))
    }

    /// Iterate the remaining blocks as owned buffers
    pub fn blocks(&mut self) -> Blocks<'_, R> {
        Blocks { reader: self }
    }

    /// The parsed header
    pub fn header(&self) -> &CoreHeader {
        &self.header
    }

    /// The loaded index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Size of one block
    pub fn block_size(&self) -> usize {
        self.header.block_size as usize
    }

    /// Number of blocks that make up the original stream
    pub fn logical_block_count(&self) -> u64 {
        self.header.logical_block_count()
    }

    /// Index of the next block `read` will return
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Release the storage
    pub fn into_inner(self) -> R {
        self.storage
    }
}

impl ContainerReader<BufReader<File>> {
    /// Open a container file
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = Self::open(BufReader::new(file))?;

        info!(
            "Opened container {} (block size {}, logical size {}, {} index nodes)",
            path.display(),
            reader.header.block_size,
            reader.header.logical_size,
            reader.header.index_size
        );
        Ok(reader)
    }
}

/// Iterator over the remaining blocks of a container
pub struct Blocks<'a, R: Read + Seek> {
    reader: &'a mut ContainerReader<R>,
}

impl<R: Read + Seek> Iterator for Blocks<'_, R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut block = vec![0u8; self.reader.block_size()];
        match self.reader.read(&mut block) {
            Ok(Some(_)) => Some(Ok(block)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
