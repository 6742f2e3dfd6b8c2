//! Error types for blockcompress.

use std::io;

/// The result type used throughout blockcompress.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for container and codec operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred on the underlying storage.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A block buffer did not match the configured block size.
    #[error("Invalid block size: expected {expected} bytes, got {actual}")]
    InvalidBlockSize {
        /// The configured block size.
        expected: usize,
        /// The length of the buffer that was passed in.
        actual: usize,
    },

    /// The container trailer or index could not be parsed.
    #[error("Format error: {0}")]
    Format(String),

    /// The storage ran out of bytes in the middle of a block.
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// The storage accepted fewer bytes than were handed to it.
    #[error("Short write: expected {expected} bytes, wrote {actual}")]
    ShortWrite {
        /// Bytes handed to the storage.
        expected: usize,
        /// Bytes the storage accepted.
        actual: usize,
    },

    /// The operation is not supported in the current mode.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// An internal invariant of the chunk codec was violated.
    #[error("Corrupt state: {0}")]
    CorruptState(String),

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Creates a new format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Creates a new unsupported operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Creates a new corrupt state error.
    pub fn corrupt_state(msg: impl Into<String>) -> Self {
        Error::CorruptState(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates an invalid block size error.
    pub fn invalid_block_size(expected: usize, actual: usize) -> Self {
        Error::InvalidBlockSize { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::format("bad magic");
        assert_eq!(err.to_string(), "Format error: bad magic");

        let err = Error::invalid_block_size(4096, 12);
        assert!(err.to_string().contains("4096"));
        assert!(err.to_string().contains("12"));

        let err = Error::ShortRead { expected: 8, actual: 3 };
        assert_eq!(err.to_string(), "Short read: expected 8 bytes, got 3");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
