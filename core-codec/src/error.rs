//! # Codec Error Types
//!
//! Error types for decoder and encoder sessions.

use crate::status::{DecoderState, EncoderState, ErrorKind};
use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during codec operations.
#[derive(Error, Debug)]
pub enum CodecError {
    // ========================================================================
    // Setup Errors
    // ========================================================================
    /// The codec could not be created or refused the callback registration.
    #[error("Codec initialization failed: {0}")]
    Init(String),

    /// Session configuration is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Stream Errors
    // ========================================================================
    /// The bound byte stream failed.
    #[error("Stream I/O failed: {0}")]
    Io(#[from] BridgeError),

    /// The codec reported a corrupted or unparseable bitstream.
    #[error("Stream integrity error: {0}")]
    StreamIntegrity(ErrorKind),

    /// The bound stream cannot perform the requested operation.
    #[error("Operation not supported by stream: {0}")]
    Unsupported(&'static str),

    /// Seek target is at or past the last sample of the stream.
    #[error("Seek target {0} is past the end of the stream")]
    SeekOutOfRange(u64),

    /// Decoded audio did not match the checksum stored in the stream.
    #[error("MD5 checksum mismatch")]
    ChecksumMismatch,

    // ========================================================================
    // Codec Errors
    // ========================================================================
    /// Decoder stopped in a non-recoverable state.
    #[error("Decoder error: {0}")]
    Decoder(DecoderState),

    /// Encoder stopped in a non-recoverable state.
    #[error("Encoder error: {0}")]
    Encoder(EncoderState),

    /// Sample block does not fit the session format.
    #[error("Invalid sample block: {0}")]
    InvalidBlock(String),

    /// Stream properties were requested before STREAMINFO was seen.
    #[error("Stream properties not yet known")]
    UninitializedProperties,

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The session was closed.
    #[error("Session is closed")]
    SessionClosed,

    /// The session failed earlier and can no longer be used.
    #[error("Session failed: {0}")]
    SessionFailed(String),
}

impl CodecError {
    /// Returns `true` if the session that produced this error can no longer
    /// process audio.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CodecError::Init(_)
                | CodecError::Io(_)
                | CodecError::StreamIntegrity(_)
                | CodecError::ChecksumMismatch
                | CodecError::Decoder(_)
                | CodecError::Encoder(_)
                | CodecError::SessionClosed
                | CodecError::SessionFailed(_)
        )
    }

    /// Returns `true` if this error describes damaged input rather than a
    /// failing stream or misuse.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            CodecError::StreamIntegrity(_) | CodecError::ChecksumMismatch
        )
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
