use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The stream cannot perform this operation at all (e.g. seeking a pipe).
    #[error("Stream operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("Stream operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` when the stream lacks the capability, as opposed to a
    /// capability that exists but failed.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, BridgeError::Unsupported(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
