//! Byte Stream Capability
//!
//! The narrow I/O contract a codec session needs from its host: a byte store
//! that can be read, written, and (optionally) repositioned.

use crate::error::{BridgeError, Result};

/// Caller-supplied byte store bound to one codec session.
///
/// Every operation except [`ByteStream::eof`] defaults to
/// [`BridgeError::Unsupported`], so a read-only source, a write-only sink or a
/// forward-only pipe only implements what it can actually do. Codec sessions
/// treat `Unsupported` from `seek`, `tell` and `length` as "carry on without
/// it" rather than as a failure.
///
/// Implementations may block (e.g. on a socket); that is the only suspension
/// point a session ever has.
///
/// # Example
///
/// ```
/// use bridge_traits::{ByteStream, Result};
///
/// /// A source that yields the same byte forever.
/// struct Tone(u8);
///
/// impl ByteStream for Tone {
///     fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
///         buf.fill(self.0);
///         Ok(buf.len())
///     }
/// }
///
/// let mut tone = Tone(0x7f);
/// let mut buf = [0u8; 4];
/// assert_eq!(tone.read(&mut buf).unwrap(), 4);
/// assert!(tone.seek(0).unwrap_err().is_unsupported());
/// assert!(!tone.eof());
/// ```
pub trait ByteStream {
    /// Read up to `buf.len()` bytes, returning how many were written into `buf`.
    ///
    /// `Ok(0)` with a non-empty buffer means nothing is available right now;
    /// whether that is the end of the stream is answered by [`ByteStream::eof`].
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let _ = buf;
        Err(BridgeError::Unsupported("read"))
    }

    /// Write all of `buf`.
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let _ = buf;
        Err(BridgeError::Unsupported("write"))
    }

    /// Move to an absolute byte offset from the start of the stream.
    fn seek(&mut self, offset: u64) -> Result<()> {
        let _ = offset;
        Err(BridgeError::Unsupported("seek"))
    }

    /// Current absolute byte offset.
    fn tell(&mut self) -> Result<u64> {
        Err(BridgeError::Unsupported("tell"))
    }

    /// Total length in bytes. Streams of unknown length return `Unsupported`.
    fn length(&mut self) -> Result<u64> {
        Err(BridgeError::Unsupported("length"))
    }

    /// Whether the read position is at the end of the stream.
    ///
    /// Streams that cannot tell answer `false`.
    fn eof(&mut self) -> bool {
        false
    }
}

impl<T: ByteStream + ?Sized> ByteStream for &mut T {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write(buf)
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        (**self).seek(offset)
    }

    fn tell(&mut self) -> Result<u64> {
        (**self).tell()
    }

    fn length(&mut self) -> Result<u64> {
        (**self).length()
    }

    fn eof(&mut self) -> bool {
        (**self).eof()
    }
}

impl<T: ByteStream + ?Sized> ByteStream for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write(buf)
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        (**self).seek(offset)
    }

    fn tell(&mut self) -> Result<u64> {
        (**self).tell()
    }

    fn length(&mut self) -> Result<u64> {
        (**self).length()
    }

    fn eof(&mut self) -> bool {
        (**self).eof()
    }
}
