//! LiFi Frame - framing and error correction
//!
//! This crate wraps a text payload in the start/stop delimiters of the optical
//! link and optionally protects it with a Hamming(7,4)-style code.

pub mod frame;
pub mod fec;
pub mod hamming;
pub mod error;

pub use error::{FrameError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        frame::{build_frame, markers, Frame, FrameBuilder},
        fec::{DecodeStatus, Decoded, ErrorStats, FecDecoder, FecEncoder},
        hamming::{hamming_check, hamming_decode, hamming_encode, hamming_pure_decode, HammingCodec},
        error::{FrameError, Result},
    };
}
