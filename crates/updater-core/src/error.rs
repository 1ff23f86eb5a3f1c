//! Error types for updater-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid randomness length: expected 32 bytes, got {0}")]
    InvalidRandomness(usize),

    #[error("Invalid chain info: {0}")]
    InvalidChainInfo(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
