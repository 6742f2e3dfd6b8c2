//! Helpers for moving whole blocks to and from storage.
//!
//! `Read::read_exact` and `Write::write_all` report a generic error when the
//! storage comes up short; these variants report how many bytes were actually
//! transferred so callers can surface `ShortRead` / `ShortWrite`.

use crate::error::{Error, Result};
use std::io::{ErrorKind, Read, Write};

/// Write all of `data`, failing with `ShortWrite` if the sink stops accepting bytes.
pub(crate) fn write_fully<W: Write + ?Sized>(sink: &mut W, data: &[u8]) -> Result<()> {
    let mut written = 0;
    while written < data.len() {
        match sink.write(&data[written..]) {
            Ok(0) => {
                return Err(Error::ShortWrite { expected: data.len(), actual: written });
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(())
}

/// Fill `buf` from `source`, returning how many bytes were read before end of file.
pub(crate) fn read_fully<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(filled)
}
