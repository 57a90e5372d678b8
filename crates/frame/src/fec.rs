//! Forward Error Correction (FEC) interfaces

use crate::Result;
use lifi_core::Bitstream;
use serde::{Deserialize, Serialize};

/// Generic FEC encoder trait
pub trait FecEncoder {
    /// Encode data bits with error correction
    fn encode(&mut self, data: &Bitstream) -> Result<Bitstream>;

    /// Get the code rate (k/n where k is data bits, n is total bits)
    fn code_rate(&self) -> f64;

    /// Get overhead bits for given input length
    fn overhead_bits(&self, input_len: usize) -> usize;
}

/// Generic FEC decoder trait
pub trait FecDecoder {
    /// Decode data and correct errors
    fn decode(&mut self, encoded: &Bitstream) -> Result<Decoded>;

    /// Check if data can be decoded without an uncorrectable error
    fn can_correct(&self, encoded: &Bitstream) -> bool;

    /// Get error statistics from last decode
    fn error_stats(&self) -> ErrorStats;
}

/// Error correction statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub detected_errors: usize,
    pub corrected_errors: usize,
    pub uncorrectable_errors: usize,
}

impl ErrorStats {
    /// Fold the statistics of one block into a running total
    pub fn merge(&mut self, other: ErrorStats) {
        self.detected_errors += other.detected_errors;
        self.corrected_errors += other.corrected_errors;
        self.uncorrectable_errors += other.uncorrectable_errors;
    }
}

/// Outcome of decoding a protected stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStatus {
    /// No block showed an error
    Clean,
    /// Every detected error was corrected
    Corrected,
    /// At least one block holds an error the code cannot repair
    UncorrectableSuspected,
}

impl DecodeStatus {
    /// Derive the overall status from accumulated statistics
    pub fn from_stats(stats: &ErrorStats) -> Self {
        if stats.uncorrectable_errors > 0 {
            DecodeStatus::UncorrectableSuspected
        } else if stats.detected_errors > 0 {
            DecodeStatus::Corrected
        } else {
            DecodeStatus::Clean
        }
    }
}

/// Decoded data bits together with how trustworthy they are
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub data: Bitstream,
    pub status: DecodeStatus,
    pub stats: ErrorStats,
}
