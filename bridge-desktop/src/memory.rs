//! In-memory byte stream

use bridge_traits::{
    error::{BridgeError, Result},
    stream::ByteStream,
};
use bytes::Bytes;

/// Growable in-memory stream
///
/// Behaves like a file: reads and writes share one position, writes past the
/// end extend the buffer (zero-filling any gap left by a seek), and every
/// [`ByteStream`] operation is supported.
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    data: Vec<u8>,
    position: u64,
}

impl MemoryStream {
    /// Create an empty stream, typically as an encoder sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read/write position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Consume the stream, returning its contents.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.data)
    }

    fn cursor(&self) -> usize {
        usize::try_from(self.position).unwrap_or(usize::MAX)
    }
}

impl From<Vec<u8>> for MemoryStream {
    fn from(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }
}

impl From<Bytes> for MemoryStream {
    fn from(data: Bytes) -> Self {
        Self::from(data.to_vec())
    }
}

impl From<&[u8]> for MemoryStream {
    fn from(data: &[u8]) -> Self {
        Self::from(data.to_vec())
    }
}

impl ByteStream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let start = self.cursor().min(self.data.len());
        let available = &self.data[start..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let start = usize::try_from(self.position).map_err(|_| {
            BridgeError::OperationFailed(format!(
                "write position {} exceeds addressable memory",
                self.position
            ))
        })?;
        let overflow = || {
            BridgeError::OperationFailed(format!(
                "writing {} bytes at {} exceeds addressable memory",
                buf.len(),
                start
            ))
        };
        let end = start.checked_add(buf.len()).ok_or_else(overflow)?;
        if end > self.data.len() {
            self.data
                .try_reserve(end - self.data.len())
                .map_err(|_| overflow())?;
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
        self.position = end as u64;
        Ok(())
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        self.position = offset;
        Ok(())
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.position)
    }

    fn length(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn eof(&mut self) -> bool {
        self.cursor() >= self.data.len()
    }
}
