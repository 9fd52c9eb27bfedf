//! Forward-only adapters over `std::io::Read` and `std::io::Write`

use bridge_traits::{
    error::{BridgeError, Result},
    stream::ByteStream,
};
use std::io::{ErrorKind, Read, Write};
use tracing::trace;

/// Forward-only source
///
/// Only `read` and `eof` are supported. Seek, tell and length report
/// [`BridgeError::Unsupported`], which a decoder treats as "this stream
/// cannot seek" rather than as a fault.
pub struct ReaderStream<R> {
    reader: R,
    bytes_read: u64,
    exhausted: bool,
}

impl<R: Read> ReaderStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes_read: 0,
            exhausted: false,
        }
    }

    /// Total bytes delivered so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteStream for ReaderStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || self.exhausted {
            return Ok(0);
        }
        let n = loop {
            match self.reader.read(buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(BridgeError::Io(e)),
            }
        };
        if n == 0 {
            trace!(total = self.bytes_read, "Reader exhausted");
            self.exhausted = true;
        }
        self.bytes_read += n as u64;
        Ok(n)
    }

    fn seek(&mut self, _offset: u64) -> Result<()> {
        Err(BridgeError::Unsupported("seek on forward-only reader"))
    }

    fn tell(&mut self) -> Result<u64> {
        Err(BridgeError::Unsupported("tell on forward-only reader"))
    }

    fn length(&mut self) -> Result<u64> {
        Err(BridgeError::Unsupported("length of forward-only reader"))
    }

    fn eof(&mut self) -> bool {
        self.exhausted
    }
}

/// Forward-only sink
///
/// Only `write` is supported. An encoder bound to it cannot go back to patch
/// the stream header, so the total sample count stays unset.
pub struct WriterStream<W> {
    writer: W,
    bytes_written: u64,
}

impl<W: Write> WriterStream<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Flush and return the wrapped writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush().map_err(BridgeError::Io)?;
        Ok(self.writer)
    }
}

impl<W: Write> ByteStream for WriterStream<W> {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.writer.write_all(buf).map_err(BridgeError::Io)?;
        self.bytes_written += buf.len() as u64;
        Ok(())
    }

    fn seek(&mut self, _offset: u64) -> Result<()> {
        Err(BridgeError::Unsupported("seek on forward-only writer"))
    }

    fn tell(&mut self) -> Result<u64> {
        Err(BridgeError::Unsupported("tell on forward-only writer"))
    }

    fn length(&mut self) -> Result<u64> {
        Err(BridgeError::Unsupported("length of forward-only writer"))
    }
}
