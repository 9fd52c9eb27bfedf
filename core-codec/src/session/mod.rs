//! # Codec Sessions
//!
//! A session binds one codec engine to one caller-supplied byte stream for
//! the stream's lifetime.
//!
//! ```text
//! Created ──open──▶ Initialized ──first operation──▶ Running ──close──▶ Finished
//!                        │                              │
//!                        └────────── fault ─────────────┴──────────▶ Errored
//! ```
//!
//! After `Finished` every operation fails with
//! [`CodecError::SessionClosed`](crate::CodecError::SessionClosed); after
//! `Errored` with [`CodecError::SessionFailed`](crate::CodecError::SessionFailed)
//! carrying the original fault. `close` is idempotent in both.

mod decoder;
mod encoder;

pub use decoder::DecoderSession;
pub use encoder::EncoderSession;

use crate::convert::SampleBlock;
use crate::error::CodecError;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Engine allocated, callbacks not yet registered.
    Created,
    /// Callbacks registered, nothing processed yet.
    Initialized,
    /// At least one codec operation has run.
    Running,
    /// Closed by the caller.
    Finished,
    /// A fault ended the session.
    Errored,
}

impl SessionState {
    /// Returns `true` if the session still accepts codec operations.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Initialized | Self::Running)
    }

    /// Returns `true` if the session is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Errored)
    }
}

/// Outcome of one decoder step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A decoded block.
    Block(SampleBlock),
    /// Metadata or other non-audio data was processed.
    Continue,
    /// The stream is exhausted.
    EndOfStream,
}

/// Outcome of [`DecoderSession::decode_frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    Block(SampleBlock),
    EndOfStream,
}

impl DecodedFrame {
    pub fn into_block(self) -> Option<SampleBlock> {
        match self {
            DecodedFrame::Block(block) => Some(block),
            DecodedFrame::EndOfStream => None,
        }
    }
}

/// Lifecycle bookkeeping shared by decoder and encoder sessions.
#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
    failure: Option<String>,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: SessionState::Created,
            failure: None,
        }
    }

    /// Fail unless codec operations are still allowed.
    fn ensure_active(&self) -> Result<(), CodecError> {
        match self.state {
            SessionState::Finished => Err(CodecError::SessionClosed),
            SessionState::Errored => Err(CodecError::SessionFailed(
                self.failure
                    .clone()
                    .unwrap_or_else(|| "unknown failure".to_string()),
            )),
            SessionState::Created => Err(CodecError::Init(
                "session has not been initialized".to_string(),
            )),
            SessionState::Initialized | SessionState::Running => Ok(()),
        }
    }

    fn mark_running(&mut self) {
        if self.state == SessionState::Initialized {
            self.state = SessionState::Running;
        }
    }

    /// Move to `Errored`, keeping the fault description for later calls.
    fn fail(&mut self, error: CodecError) -> CodecError {
        self.state = SessionState::Errored;
        self.failure = Some(error.to_string());
        error
    }
}
