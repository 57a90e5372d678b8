//! Error types for LiFi Frame

use thiserror::Error;

/// Frame processing error types
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Invalid input: {msg}")]
    InvalidInput { msg: String },

    #[error("Core error: {0}")]
    Core(#[from] lifi_core::CoreError),

    #[error("Codec error: {0}")]
    Codec(#[from] lifi_codecs::CodecError),
}

/// Result type for LiFi Frame operations
pub type Result<T> = std::result::Result<T, FrameError>;
