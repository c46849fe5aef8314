//! Channel error types

use thiserror::Error;

/// Channel error type
#[derive(Debug, Error)]
pub enum MessageError {
    /// Connection could not be established or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Underlying socket failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame or payload could not be decoded
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// Result type for channel operations
pub type MessageResult<T> = Result<T, MessageError>;
