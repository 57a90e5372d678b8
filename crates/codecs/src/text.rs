//! Text codec implementations

use crate::{CodecError, Result};
use lifi_core::Bitstream;
use tracing::debug;

/// Width of one payload symbol in bits
pub const SYMBOL_BITS: usize = 8;

/// Generic text codec trait
pub trait TextCodec {
    /// Encode text to bytes
    fn encode(&mut self, text: &str) -> Result<Vec<u8>>;

    /// Decode bytes to text
    fn decode(&mut self, data: &[u8]) -> Result<String>;

    /// Get compression ratio (0.0 to 1.0, lower is better compression)
    fn compression_ratio(&self) -> f64;

    /// Reset codec state
    fn reset(&mut self);
}

/// Encode a sequence of UTF-16 code units as UTF-8 bytes.
///
/// Any surrogate unit, high or low, is combined with the unit that follows it
/// and emitted as a four byte sequence. A lone surrogate therefore swallows
/// its neighbour (or a zero unit at the end of input) instead of being
/// replaced.
pub fn encode_utf16_units(units: &[u16]) -> Vec<u8> {
    let mut utf8 = Vec::with_capacity(units.len() * 3);
    let mut i = 0;

    while i < units.len() {
        let unit = units[i] as u32;

        if unit < 0x80 {
            utf8.push(unit as u8);
        } else if unit < 0x800 {
            utf8.push((0xC0 | (unit >> 6)) as u8);
            utf8.push((0x80 | (unit & 0x3F)) as u8);
        } else if !(0xD800..0xE000).contains(&unit) {
            utf8.push((0xE0 | (unit >> 12)) as u8);
            utf8.push((0x80 | ((unit >> 6) & 0x3F)) as u8);
            utf8.push((0x80 | (unit & 0x3F)) as u8);
        } else {
            i += 1;
            let low = units.get(i).copied().unwrap_or(0) as u32;
            let code_point = 0x10000 + (((unit & 0x3FF) << 10) | (low & 0x3FF));
            utf8.push((0xF0 | (code_point >> 18)) as u8);
            utf8.push((0x80 | ((code_point >> 12) & 0x3F)) as u8);
            utf8.push((0x80 | ((code_point >> 6) & 0x3F)) as u8);
            utf8.push((0x80 | (code_point & 0x3F)) as u8);
        }

        i += 1;
    }

    utf8
}

/// Encode text into its UTF-8 byte symbols
pub fn encode_text_to_bytes(text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    encode_utf16_units(&units)
}

/// Byte symbols of `text`, each as an 8-bit zero-padded field
pub fn framer_bits(text: &str) -> Bitstream {
    bytes_to_bits(&encode_text_to_bytes(text))
}

/// Expand byte symbols to bits, MSB first
pub fn bytes_to_bits(bytes: &[u8]) -> Bitstream {
    let mut bits = Bitstream::with_capacity(bytes.len() * SYMBOL_BITS);
    for &byte in bytes {
        bits.append(&lifi_core::to_binary(byte as u32, SYMBOL_BITS));
    }
    bits
}

/// UTF-8 byte framer (no compression)
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Framer;

impl TextCodec for Utf8Framer {
    fn encode(&mut self, text: &str) -> Result<Vec<u8>> {
        let bytes = encode_text_to_bytes(text);
        debug!("Framed {} chars into {} byte symbols", text.chars().count(), bytes.len());
        Ok(bytes)
    }

    fn decode(&mut self, data: &[u8]) -> Result<String> {
        String::from_utf8(data.to_vec()).map_err(|e| CodecError::DecodingFailed {
            msg: format!("Invalid UTF-8: {}", e),
        })
    }

    fn compression_ratio(&self) -> f64 {
        1.0 // No compression
    }

    fn reset(&mut self) {
        // Stateless
    }
}
