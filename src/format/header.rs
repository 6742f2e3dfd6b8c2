//! Container header (trailer) implementation.
//!
//! The header is a fixed-size (32 bytes) record at the end of a container
//! that describes the block size, the logical stream length and the sizes of
//! the index and payload regions.

use crate::error::{Error, Result};
use crate::format::{HEADER_SIZE, MAGIC};
use crate::storage::write_fully;
use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;
use std::io::{ErrorKind, Read, Write};

/// CoreHeader is the last 32 bytes of a container file.
///
/// Format:
/// ```text
/// [magic: 4 bytes]
/// [block_size: 4 bytes]
/// [logical_size: 8 bytes]
/// [index_size: 8 bytes]
/// [payload_size: 8 bytes]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoreHeader {
    /// Magic number, always `MAGIC` for a valid container
    pub magic: u32,
    /// Size of one logical block in bytes
    pub block_size: u32,
    /// Length of the original stream in bytes, as tracked by the caller
    pub logical_size: u64,
    /// Number of index nodes
    pub index_size: u64,
    /// Number of bytes in the payload region
    pub payload_size: u64,
}

impl CoreHeader {
    /// Create a header for an empty container
    pub fn new(block_size: u32, logical_size: u64) -> Self {
        Self { magic: MAGIC, block_size, logical_size, index_size: 0, payload_size: 0 }
    }

    /// Encode the header to bytes (32 bytes)
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        buf.put_u32(self.magic);
        buf.put_u32(self.block_size);
        buf.put_u64(self.logical_size);
        buf.put_u64(self.index_size);
        buf.put_u64(self.payload_size);

        debug_assert_eq!(buf.len(), HEADER_SIZE);
        buf.to_vec()
    }

    /// Decode a header from bytes
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() != HEADER_SIZE {
            return Err(Error::format(format!(
                "Header size mismatch: expected {}, got {}",
                HEADER_SIZE,
                data.len()
            )));
        }

        // Check the magic first; nothing else is trusted without it
        let magic = data.get_u32();
        if magic != MAGIC {
            return Err(Error::format(format!(
                "Invalid container magic number: expected {:#x}, got {:#x}",
                MAGIC, magic
            )));
        }

        let block_size = data.get_u32();
        if block_size == 0 {
            return Err(Error::format("Block size in header is zero"));
        }

        let logical_size = data.get_u64();
        let index_size = data.get_u64();
        let payload_size = data.get_u64();

        Ok(Self { magic, block_size, logical_size, index_size, payload_size })
    }

    /// Write the header to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_fully(writer, &self.encode())
    }

    /// Read the header from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::format("Header truncated"),
            _ => Error::Io(e),
        })?;
        Self::decode(&buf)
    }

    /// Number of logical blocks needed to hold `logical_size` bytes
    pub fn logical_block_count(&self) -> u64 {
        self.logical_size.div_ceil(self.block_size as u64)
    }

    /// Number of non-zero blocks stored in the payload region
    pub fn payload_block_count(&self) -> u64 {
        self.payload_size / self.block_size as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_encode_decode() {
        let header = CoreHeader {
            magic: MAGIC,
            block_size: 4096,
            logical_size: 1 << 33,
            index_size: 17,
            payload_size: 4096 * 40,
        };

        let encoded = header.encode();
        assert_eq!(encoded.len(), HEADER_SIZE);

        let decoded = CoreHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_header_big_endian_layout() {
        let header = CoreHeader::new(4, 0x0102_0304_0506_0708);
        let encoded = header.encode();

        assert_eq!(&encoded[0..4], &[0x47, 0x42, 0x43, 0x4D]);
        assert_eq!(&encoded[4..8], &[0, 0, 0, 4]);
        assert_eq!(&encoded[8..16], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&encoded[16..32], &[0u8; 16]);
    }

    #[test]
    fn test_header_invalid_magic() {
        let mut data = CoreHeader::new(4096, 0).encode();
        data[0] ^= 0xFF;

        let result = CoreHeader::decode(&data);
        assert!(matches!(result.unwrap_err(), Error::Format(_)));
    }

    #[test]
    fn test_header_zero_block_size() {
        let data = CoreHeader::new(0, 0).encode();
        assert!(matches!(CoreHeader::decode(&data).unwrap_err(), Error::Format(_)));
    }

    #[test]
    fn test_header_truncated() {
        let data = CoreHeader::new(4096, 0).encode();
        let mut cursor = Cursor::new(&data[..20]);

        let result = CoreHeader::read_from(&mut cursor);
        assert!(matches!(result.unwrap_err(), Error::Format(_)));
    }

    #[test]
    fn test_header_write_read() {
        let mut header = CoreHeader::new(512, 10_000);
        header.index_size = 3;
        header.payload_size = 512 * 5;

        let mut buffer = Vec::new();
        header.write_to(&mut buffer).unwrap();

        let mut cursor = Cursor::new(buffer);
        assert_eq!(CoreHeader::read_from(&mut cursor).unwrap(), header);
    }

    #[test]
    fn test_header_block_counts() {
        let mut header = CoreHeader::new(4096, 4096 * 3 + 1);
        header.payload_size = 4096 * 2;

        assert_eq!(header.logical_block_count(), 4);
        assert_eq!(header.payload_block_count(), 2);
    }
}
