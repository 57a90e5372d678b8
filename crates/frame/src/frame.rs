//! Frame structure and construction

use crate::hamming::HammingCodec;
use crate::Result;
use lifi_codecs::text::{bytes_to_bits, TextCodec, Utf8Framer, SYMBOL_BITS};
use lifi_core::{to_binary, Bitstream};
use tracing::debug;

/// Frame delimiter constants
pub mod markers {
    /// Start marker `11110011`; never a valid UTF-8 lead byte
    pub const START: u8 = 0xF3;
    /// Stop marker, the UTF-8 encoding of `'\n'`
    pub const STOP: u8 = b'\n';
    /// Trailing bit that parks the light at its idle level
    pub const RESET_BIT: bool = true;
}

/// Complete frame: delimiters around a raw or Hamming protected payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub start: Bitstream,
    pub payload: Bitstream,
    pub stop: Bitstream,
    pub reset: bool,
    payload_bytes: usize,
    hamming: Option<HammingCodec>,
}

impl Frame {
    /// Flatten into the bit sequence handed to the modulator
    pub fn to_bitstream(&self) -> Bitstream {
        let mut bits = Bitstream::with_capacity(self.len());
        bits.append(&self.start);
        bits.append(&self.payload);
        bits.append(&self.stop);
        bits.push(self.reset);
        bits
    }

    /// Total frame length in bits, reset bit included
    pub fn len(&self) -> usize {
        self.start.len() + self.payload.len() + self.stop.len() + 1
    }

    /// A frame always carries its delimiters
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of UTF-8 byte symbols in the payload
    pub fn payload_byte_count(&self) -> usize {
        self.payload_bytes
    }

    /// Whether the payload is Hamming protected
    pub fn is_hamming_encoded(&self) -> bool {
        self.hamming.is_some()
    }

    /// Whether the payload blocks carry an overall parity bit
    pub fn has_extra_parity(&self) -> bool {
        self.hamming.as_ref().is_some_and(HammingCodec::extra_parity)
    }
}

/// Frame builder for constructing frames with various options
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    hamming: bool,
    extra_parity: bool,
}

impl FrameBuilder {
    /// Create a new frame builder (no error correction)
    pub fn new() -> Self {
        Self::default()
    }

    /// Protect the payload with the Hamming code
    pub fn hamming(mut self, enabled: bool) -> Self {
        self.hamming = enabled;
        self
    }

    /// Append an overall parity bit to every Hamming block.
    ///
    /// Has no effect unless Hamming protection is enabled.
    pub fn extra_parity(mut self, enabled: bool) -> Self {
        self.extra_parity = enabled;
        self
    }

    /// Build frame around `text`
    pub fn build(self, text: &str) -> Result<Frame> {
        let bytes = Utf8Framer.encode(text)?;
        let raw_payload = bytes_to_bits(&bytes);

        let (payload, hamming) = if self.hamming {
            let codec = HammingCodec::new(self.extra_parity);
            (codec.encode(&raw_payload)?, Some(codec))
        } else {
            (raw_payload, None)
        };

        let frame = Frame {
            start: to_binary(markers::START as u32, SYMBOL_BITS),
            payload,
            stop: to_binary(markers::STOP as u32, SYMBOL_BITS),
            reset: markers::RESET_BIT,
            payload_bytes: bytes.len(),
            hamming,
        };

        debug!(
            "Frame built: {} payload bytes, {} payload bits, {} total bits (hamming: {}, extra parity: {})",
            frame.payload_bytes,
            frame.payload.len(),
            frame.len(),
            frame.is_hamming_encoded(),
            frame.has_extra_parity()
        );

        Ok(frame)
    }
}

/// Build the complete bit sequence for `text`
pub fn build_frame(text: &str, use_hamming: bool, use_extra_parity: bool) -> Result<Bitstream> {
    let frame = FrameBuilder::new()
        .hamming(use_hamming)
        .extra_parity(use_extra_parity)
        .build(text)?;
    Ok(frame.to_bitstream())
}
