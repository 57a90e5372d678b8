//! Error types for LiFi Core

use thiserror::Error;

/// Core error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid input: {msg}")]
    InvalidInput { msg: String },

    #[error("Bit index {index} out of range for stream of {len} bits")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result type for LiFi Core operations
pub type Result<T> = std::result::Result<T, CoreError>;
