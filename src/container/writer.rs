//! Container writer implementation.

use crate::codec::ChunkEncoder;
use crate::config::Options;
use crate::error::{Error, Result};
use crate::format::{CoreHeader, Index, MAX_BLOCK_SIZE};
use log::{info, warn};
use std::fs::File;
use std::io::{BufWriter, SeekFrom, Write};
use std::path::Path;

/// ContainerWriter builds a container from a sequence of fixed-size blocks.
///
/// Nothing but payload bytes reaches the storage until [`close`] writes the
/// index followed by the header.
///
/// Usage:
/// ```no_run
/// use blockcompress::{ContainerWriter, Options};
///
/// let options = Options::default();
/// let mut writer = ContainerWriter::create_file("disk.gbcm", 8192, &options).unwrap();
/// writer.write(&[0u8; 4096]).unwrap();
/// writer.write(&[0xAB; 4096]).unwrap();
/// writer.close_file(options.sync_on_close).unwrap();
/// ```
///
/// [`close`]: ContainerWriter::close
pub struct ContainerWriter<W: Write> {
    /// `None` once the writer has been closed
    storage: Option<W>,
    header: CoreHeader,
    encoder: ChunkEncoder,
}

impl<W: Write> ContainerWriter<W> {
    /// Start a new container on `storage`.
    ///
    /// `logical_size` is the length of the original stream in bytes; it is
    /// recorded as-is and never derived from the blocks written.
    pub fn create(storage: W, block_size: u32, logical_size: u64) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::invalid_argument("block_size must be > 0"));
        }
        if block_size > MAX_BLOCK_SIZE {
            return Err(Error::invalid_argument(format!(
                "block_size {} exceeds the maximum of {}",
                block_size, MAX_BLOCK_SIZE
            )));
        }

        Ok(Self {
            storage: Some(storage),
            header: CoreHeader::new(block_size, logical_size),
            encoder: ChunkEncoder::new(block_size as usize),
        })
    }

    /// Write one block of exactly `block_size` bytes
    pub fn write(&mut self, block: &[u8]) -> Result<()> {
        let storage = self
            .storage
            .as_mut()
            .ok_or_else(|| Error::corrupt_state("Container writer is closed"))?;
        self.encoder.submit(block, storage)?;
        self.header.payload_size = self.encoder.payload_size();
        Ok(())
    }

    /// Seeking is not supported while writing; the format is append-only.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Err(Error::unsupported(format!("seek to {:?} on a container writer", pos)))
    }

    /// Finalize the container and hand back the storage.
    ///
    /// Flushes a trailing partial chunk, then writes the index and then the
    /// header. The order matters: readers locate the index by stepping back
    /// from the header at the end of the file.
    pub fn finish(mut self) -> Result<(CoreHeader, W)> {
        let mut storage = self
            .storage
            .take()
            .ok_or_else(|| Error::corrupt_state("Container writer is closed"))?;

        self.encoder.finalize(&mut storage)?;

        let index = self.encoder.index();
        index.write_to(&mut storage)?;

        self.header.index_size = index.len() as u64;
        self.header.payload_size = self.encoder.payload_size();
        self.header.write_to(&mut storage)?;
        storage.flush()?;

        info!(
            "Closed container: {} blocks, {} zero blocks, {} payload bytes, {} index nodes",
            self.encoder.blocks_submitted(),
            self.encoder.zero_block_count(),
            self.header.payload_size,
            self.header.index_size
        );

        Ok((self.header, storage))
    }

    /// Finalize the container and release the storage
    pub fn close(self) -> Result<CoreHeader> {
        let (header, _storage) = self.finish()?;
        Ok(header)
    }

    /// The header as it would be written now
    pub fn header(&self) -> &CoreHeader {
        &self.header
    }

    /// The index nodes of all completed chunks
    pub fn index(&self) -> &Index {
        self.encoder.index()
    }

    /// Number of blocks accepted so far
    pub fn blocks_written(&self) -> u64 {
        self.encoder.blocks_submitted()
    }

    /// Size of one block
    pub fn block_size(&self) -> usize {
        self.header.block_size as usize
    }
}

impl ContainerWriter<BufWriter<File>> {
    /// Create a container file at `path`, truncating any existing file
    pub fn create_file<P: AsRef<Path>>(
        path: P,
        logical_size: u64,
        options: &Options,
    ) -> Result<Self> {
        options.validate()?;

        let path = path.as_ref();
        let file = File::create(path)?;
        let writer = BufWriter::with_capacity(options.write_buffer_size, file);

        info!(
            "Creating container {} (block size {}, logical size {})",
            path.display(),
            options.block_size,
            logical_size
        );
        Self::create(writer, options.block_size, logical_size)
    }

    /// Finalize the container file, optionally syncing it to disk
    pub fn close_file(self, sync: bool) -> Result<CoreHeader> {
        let (header, writer) = self.finish()?;
        let file = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        if sync {
            file.sync_all()?;
        }
        Ok(header)
    }
}

impl<W: Write> Drop for ContainerWriter<W> {
    fn drop(&mut self) {
        if self.storage.is_some() {
            warn!(
                "Container writer dropped without close after {} blocks; the file has no trailer",
                self.encoder.blocks_submitted()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerReader;
    use crate::format::{HEADER_SIZE, INDEX_NODE_SIZE, MAGIC};
    use std::io::{self, Cursor};
    use tempfile::NamedTempFile;

    /// Sink that errors on its `fail_at`-th `write` call only
    struct FlakySink {
        data: Vec<u8>,
        calls: usize,
        fail_at: usize,
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls == self.fail_at {
                return Err(io::Error::other("transient failure"));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Sink that accepts nothing once `capacity` bytes are stored
    struct FullSink {
        data: Vec<u8>,
        capacity: usize,
    }

    impl Write for FullSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.capacity - self.data.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_close_pads_partial_chunk() {
        let mut storage = Vec::new();
        {
            let mut writer = ContainerWriter::create(&mut storage, 4, 16).unwrap();
            for _ in 0..7 {
                writer.write(&[1, 1, 1, 1]).unwrap();
            }
            assert_eq!(writer.blocks_written(), 7);
            writer.close().unwrap();
        }
        // The padding block is zero, so only the 7 written blocks reach the payload
        assert_eq!(storage.len(), 7 * 4 + INDEX_NODE_SIZE + HEADER_SIZE);
    }

    #[test]
    fn test_create_zero_block_size() {
        let result = ContainerWriter::create(Vec::new(), 0, 0);
        assert!(matches!(result.err(), Some(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_create_oversized_block_size() {
        let result = ContainerWriter::create(Vec::new(), u32::MAX, 0);
        assert!(matches!(result.err(), Some(Error::InvalidArgument(_))));

        let result = ContainerWriter::create(Vec::new(), MAX_BLOCK_SIZE + 1, 0);
        assert!(matches!(result.err(), Some(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_layout_index_then_header() {
        let writer = {
            let mut writer = ContainerWriter::create(Vec::new(), 4, 12).unwrap();
            writer.write(&[0, 0, 0, 0]).unwrap();
            writer.write(&[0xDE, 0xAD, 0xDE, 0xAD]).unwrap();
            writer.write(&[0, 0, 0, 0]).unwrap();
            writer
        };
        let (header, bytes) = writer.finish().unwrap();

        assert_eq!(header.magic, MAGIC);
        assert_eq!(header.index_size, 1);
        assert_eq!(header.payload_size, 4);
        assert_eq!(header.logical_size, 12);

        assert_eq!(bytes.len(), 4 + INDEX_NODE_SIZE + HEADER_SIZE);
        assert_eq!(&bytes[..4], &[0xDE, 0xAD, 0xDE, 0xAD]);

        // Index node: zero_count_before = 0, bitmap = all but slot 1
        let node = &bytes[4..4 + INDEX_NODE_SIZE];
        assert_eq!(&node[..8], &[0u8; 8]);
        assert_eq!(node[8], 0b1111_1101);

        let trailer = CoreHeader::decode(&bytes[4 + INDEX_NODE_SIZE..]).unwrap();
        assert_eq!(trailer, header);
    }

    #[test]
    fn test_write_invalid_block_size() {
        let mut writer = ContainerWriter::create(Vec::new(), 4096, 0).unwrap();
        let err = writer.write(&[0u8; 100]).unwrap_err();
        assert!(matches!(err, Error::InvalidBlockSize { expected: 4096, actual: 100 }));
        assert_eq!(writer.blocks_written(), 0);
        writer.close().unwrap();
    }

    #[test]
    fn test_seek_unsupported() {
        let mut writer = ContainerWriter::create(Vec::new(), 4096, 0).unwrap();
        let err = writer.seek(SeekFrom::Start(0)).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        writer.close().unwrap();
    }

    #[test]
    fn test_empty_container() {
        let writer = ContainerWriter::create(Vec::new(), 4096, 0).unwrap();
        let (header, bytes) = writer.finish().unwrap();
        assert_eq!(header.index_size, 0);
        assert_eq!(header.payload_size, 0);
        assert_eq!(bytes.len(), HEADER_SIZE);
    }

    #[test]
    fn test_create_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let options = Options::new().block_size(512);

        let mut writer = ContainerWriter::create_file(temp_file.path(), 1024, &options).unwrap();
        writer.write(&[7u8; 512]).unwrap();
        writer.write(&[0u8; 512]).unwrap();
        let header = writer.close_file(true).unwrap();

        let file_len = std::fs::metadata(temp_file.path()).unwrap().len();
        assert_eq!(file_len, 512 + INDEX_NODE_SIZE as u64 + HEADER_SIZE as u64);
        assert_eq!(header.payload_size, 512);
    }

    #[test]
    fn test_payload_size_tracks_writes() {
        let mut writer = ContainerWriter::create(Vec::new(), 2, 0).unwrap();
        for i in 0..16u8 {
            writer.write(&[i % 2, 0]).unwrap();
        }
        // Two full chunks flushed, half of the blocks are zero
        assert_eq!(writer.header().payload_size, 16);
        assert_eq!(writer.index().len(), 2);
        writer.close().unwrap();
    }

    #[test]
    fn test_close_after_failed_flush() {
        let mut sink = FlakySink { data: Vec::new(), calls: 0, fail_at: 2 };
        let mut failures = 0;
        {
            let mut writer = ContainerWriter::create(&mut sink, 4, 32).unwrap();
            for i in 0..8u8 {
                if writer.write(&[i + 1; 4]).is_err() {
                    failures += 1;
                }
            }
            assert_eq!(failures, 1);

            let err = writer.close().unwrap_err();
            assert!(matches!(err, Error::CorruptState(_)));
        }

        // No trailer was written over the partial payload
        assert_eq!(sink.data, vec![1; 4]);
        assert!(ContainerReader::open(Cursor::new(sink.data)).is_err());
    }

    #[test]
    fn test_short_write_on_block() {
        let sink = FullSink { data: Vec::new(), capacity: 6 };
        let mut writer = ContainerWriter::create(sink, 4, 32).unwrap();
        for _ in 0..7 {
            writer.write(&[9; 4]).unwrap();
        }

        let err = writer.write(&[9; 4]).unwrap_err();
        assert!(matches!(err, Error::ShortWrite { expected: 4, actual: 2 }));
        assert!(matches!(writer.close().unwrap_err(), Error::CorruptState(_)));
    }

    #[test]
    fn test_short_write_on_close() {
        // Room for the payload and index, not for the header
        let sink = FullSink { data: Vec::new(), capacity: 4 + INDEX_NODE_SIZE + 10 };
        let mut writer = ContainerWriter::create(sink, 4, 4).unwrap();
        writer.write(&[5; 4]).unwrap();

        let err = writer.close().unwrap_err();
        assert!(matches!(err, Error::ShortWrite { expected: HEADER_SIZE, actual: 10 }));
    }
}
