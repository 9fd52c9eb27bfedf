//! File-backed byte stream using `std::fs`

use bridge_traits::{
    error::{BridgeError, Result},
    stream::ByteStream,
};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Seekable file stream
///
/// Supports every [`ByteStream`] operation, so a codec session bound to it
/// can seek while decoding and rewrite the stream header when encoding.
pub struct FileStream {
    file: File,
    path: PathBuf,
}

impl FileStream {
    /// Open an existing file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(Self::map_io_error)?;
        debug!(path = ?path, "Opened file stream for reading");
        Ok(Self { file, path })
    }

    /// Create (or truncate) a file for reading and writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created file stream");
        Ok(Self { file, path })
    }

    /// Path this stream was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered writes and sync them to disk.
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush().map_err(Self::map_io_error)?;
        self.file.sync_all().map_err(Self::map_io_error)
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

impl ByteStream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file.read(buf).map_err(Self::map_io_error)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.file.write_all(buf).map_err(Self::map_io_error)
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map(|_| ())
            .map_err(Self::map_io_error)
    }

    fn tell(&mut self) -> Result<u64> {
        self.file.stream_position().map_err(Self::map_io_error)
    }

    fn length(&mut self) -> Result<u64> {
        let metadata = self.file.metadata().map_err(Self::map_io_error)?;
        Ok(metadata.len())
    }

    fn eof(&mut self) -> bool {
        match (self.tell(), self.length()) {
            (Ok(position), Ok(length)) => position >= length,
            _ => false,
        }
    }
}
