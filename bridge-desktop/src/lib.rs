//! # Desktop Bridge Implementations
//!
//! Default [`ByteStream`](bridge_traits::ByteStream) adapters for desktop
//! platforms (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - [`FileStream`] - seekable file on the local filesystem (`std::fs`)
//! - [`MemoryStream`] - growable in-memory buffer, readable and writable
//! - [`ReaderStream`] - forward-only source over any `std::io::Read`
//!   (pipes, sockets, decompressors); seek/tell/length are unsupported
//! - [`WriterStream`] - forward-only sink over any `std::io::Write`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::FileStream;
//! use core_codec::{DecoderConfig, DecoderSession};
//!
//! let mut file = FileStream::open("/path/to/track.flac")?;
//! let mut session = DecoderSession::open(&mut file, DecoderConfig::default())?;
//! ```

mod filesystem;
mod memory;
mod pipe;

pub use filesystem::FileStream;
pub use memory::MemoryStream;
pub use pipe::{ReaderStream, WriterStream};
