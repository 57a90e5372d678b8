//! Error types for LiFi Modem

use thiserror::Error;

/// Modem error types
#[derive(Error, Debug)]
pub enum ModemError {
    #[error("Invalid configuration: {msg}")]
    InvalidConfig { msg: String },

    #[error("A transmission is already in progress")]
    TransmissionInProgress,

    #[error("Display sink failed: {msg}")]
    Sink { msg: String },

    #[error("Core error: {0}")]
    Core(#[from] lifi_core::CoreError),
}

/// Result type for LiFi Modem operations
pub type Result<T> = std::result::Result<T, ModemError>;
