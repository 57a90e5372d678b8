//! LiFi Codecs - text codecs for the optical link
//!
//! This crate turns text into the byte symbols carried by a frame payload.

pub mod text;
pub mod error;

pub use error::{CodecError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        text::{encode_text_to_bytes, encode_utf16_units, framer_bits, TextCodec, Utf8Framer},
        error::{CodecError, Result},
    };
}
