//! Error types for the printer session crate

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Device could not be opened or probed
    #[error("Printer unavailable: {0}")]
    Unavailable(String),

    /// Operation exceeded its wall-clock bound
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Renderer failed while producing essential content
    #[error("Render failed: {0}")]
    Render(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
