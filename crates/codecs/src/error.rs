//! Error types for LiFi Codecs

use thiserror::Error;

/// Codec error types
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Decoding failed: {msg}")]
    DecodingFailed { msg: String },

    #[error("Core error: {0}")]
    Core(#[from] lifi_core::CoreError),
}

/// Result type for LiFi Codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
