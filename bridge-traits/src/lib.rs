//! # Host Bridge Traits
//!
//! Capability traits that the host must implement for the codec core.
//!
//! ## Overview
//!
//! This crate defines the contract between the codec core and the byte stores
//! it reads from or writes to. The core never opens files or sockets itself;
//! every session is bound to a [`ByteStream`] supplied by the caller.
//!
//! ## Traits
//!
//! - [`ByteStream`](stream::ByteStream) - read / write / seek / tell / length / eof
//!
//! ## Error Handling
//!
//! All capabilities use [`BridgeError`](error::BridgeError). Implementations
//! should:
//!
//! - Return [`BridgeError::Unsupported`] for operations the store cannot do
//!   (seeking a pipe, asking a socket for its length)
//! - Convert platform errors into `BridgeError::Io` or `OperationFailed`
//!
//! ## Thread Safety
//!
//! `ByteStream` does not require `Send`; a session is `Send` exactly when the
//! stream it is bound to is.
//!
//! ## Adapters
//!
//! | Store | Implementation Crate |
//! |-------|---------------------|
//! | File, memory, `Read`/`Write` pipes | `bridge-desktop` |

pub mod error;
pub mod stream;

pub use error::{BridgeError, Result};
pub use stream::ByteStream;
