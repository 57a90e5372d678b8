//! Hamming(7,4)-style block code with optional overall parity (SECDED)
//!
//! Every 4-bit nibble becomes one block. Parity bits sit at the power-of-two
//! positions (1-based) and data bits fill the rest, so a nibble yields a
//! 7-bit block, or 8 bits when the overall parity bit is appended.
//!
//! Parity bit `p` covers the runs `[p, 2p)`, `[3p, 4p)`, ... of the block,
//! which is the standard Hamming group coverage (`pos & p != 0`). On decode
//! the positions of the failing parity checks add up to the 1-based index of
//! a single corrupted bit.

use crate::fec::{DecodeStatus, Decoded, ErrorStats, FecDecoder, FecEncoder};
use crate::{FrameError, Result};
use lifi_core::{even_parity, Bitstream};
use tracing::{debug, warn};

/// Data bits carried by one block
pub const DATA_BITS: usize = 4;

/// Hamming codec
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HammingCodec {
    extra_parity: bool,
    last_stats: ErrorStats,
}

impl HammingCodec {
    /// Create a new codec; `extra_parity` appends an overall parity bit per block
    pub fn new(extra_parity: bool) -> Self {
        Self {
            extra_parity,
            last_stats: ErrorStats::default(),
        }
    }

    /// Whether blocks carry the overall parity bit
    pub fn extra_parity(&self) -> bool {
        self.extra_parity
    }

    /// Length of one encoded block in bits
    pub fn block_len(&self) -> usize {
        hamming_len(DATA_BITS) + usize::from(self.extra_parity)
    }

    /// Encode data bits; the length must be a multiple of 4
    pub fn encode(&self, data: &Bitstream) -> Result<Bitstream> {
        if data.len() % DATA_BITS != 0 {
            return Err(FrameError::InvalidInput {
                msg: format!(
                    "Hamming input length {} is not a multiple of {}",
                    data.len(),
                    DATA_BITS
                ),
            });
        }

        let mut encoded = Bitstream::with_capacity(data.len() / DATA_BITS * self.block_len());
        for nibble in data.chunks(DATA_BITS) {
            encoded.extend(encode_block(nibble, self.extra_parity));
        }
        Ok(encoded)
    }

    /// Encode a textual bit string such as `"1011"`
    pub fn encode_str(&self, data: &str) -> Result<Bitstream> {
        self.encode(&parse_bits(data)?)
    }

    /// Strip the parity positions without checking them
    pub fn pure_decode(&self, input: &Bitstream) -> Result<Bitstream> {
        let block_len = self.check_block_alignment(input)?;
        let hamming_len = hamming_len(DATA_BITS);

        let mut data = Bitstream::with_capacity(input.len() / block_len * DATA_BITS);
        for block in input.chunks(block_len) {
            data.extend(strip_parity(&block[..hamming_len]));
        }
        Ok(data)
    }

    /// Decode and correct single-bit errors block by block
    pub fn decode(&self, input: &Bitstream) -> Result<Decoded> {
        let block_len = self.check_block_alignment(input)?;

        let mut data = Bitstream::with_capacity(input.len() / block_len * DATA_BITS);
        let mut stats = ErrorStats::default();

        for (index, block) in input.chunks(block_len).enumerate() {
            let (nibble, block_stats) = self.decode_block(block);
            if block_stats.uncorrectable_errors > 0 {
                warn!("Hamming block {} holds an uncorrectable error", index);
            } else if block_stats.corrected_errors > 0 {
                debug!("Hamming block {} corrected", index);
            }
            stats.merge(block_stats);
            data.extend(nibble);
        }

        Ok(Decoded {
            data,
            status: DecodeStatus::from_stats(&stats),
            stats,
        })
    }

    /// Decode a textual bit string; non-binary characters are rejected
    pub fn decode_str(&self, input: &str) -> Result<Decoded> {
        self.decode(&parse_bits(input)?)
    }

    /// True when re-encoding the stripped data does not reproduce `input`
    pub fn check(&self, input: &Bitstream) -> Result<bool> {
        let reencoded = self.encode(&self.pure_decode(input)?)?;
        Ok(&reencoded != input)
    }

    fn check_block_alignment(&self, input: &Bitstream) -> Result<usize> {
        let block_len = self.block_len();
        if input.len() % block_len != 0 {
            return Err(FrameError::InvalidInput {
                msg: format!(
                    "Hamming input length {} is not a multiple of the block length {}",
                    input.len(),
                    block_len
                ),
            });
        }
        Ok(block_len)
    }

    fn decode_block(&self, block: &[bool]) -> (Vec<bool>, ErrorStats) {
        let hamming_len = hamming_len(DATA_BITS);
        let mut received = block[..hamming_len].to_vec();

        let candidate = strip_parity(&received);
        let reencoded = encode_block(&candidate, false);
        let syndrome: usize = parity_positions(hamming_len)
            .filter(|&p| reencoded[p - 1] != received[p - 1])
            .sum();

        let mut stats = ErrorStats::default();

        if !self.extra_parity {
            if syndrome != 0 {
                stats.detected_errors = 1;
                if syndrome <= hamming_len {
                    received[syndrome - 1] = !received[syndrome - 1];
                    stats.corrected_errors = 1;
                } else {
                    stats.uncorrectable_errors = 1;
                }
            }
            return (strip_parity(&received), stats);
        }

        let overall_ok = even_parity(&received) == block[hamming_len];
        match (syndrome, overall_ok) {
            (0, true) => {}
            // Only the overall parity bit was hit; the data is intact.
            (0, false) => {
                stats.detected_errors = 1;
                stats.corrected_errors = 1;
            }
            (s, false) if s <= hamming_len => {
                received[s - 1] = !received[s - 1];
                stats.detected_errors = 1;
                stats.corrected_errors = 1;
            }
            // Parity consistent but syndrome set: two bits flipped.
            _ => {
                stats.detected_errors = 2;
                stats.uncorrectable_errors = 1;
            }
        }

        (strip_parity(&received), stats)
    }
}

impl FecEncoder for HammingCodec {
    fn encode(&mut self, data: &Bitstream) -> Result<Bitstream> {
        HammingCodec::encode(self, data)
    }

    fn code_rate(&self) -> f64 {
        DATA_BITS as f64 / self.block_len() as f64
    }

    fn overhead_bits(&self, input_len: usize) -> usize {
        input_len.div_ceil(DATA_BITS) * (self.block_len() - DATA_BITS)
    }
}

impl FecDecoder for HammingCodec {
    fn decode(&mut self, encoded: &Bitstream) -> Result<Decoded> {
        let decoded = HammingCodec::decode(self, encoded)?;
        self.last_stats = decoded.stats;
        Ok(decoded)
    }

    fn can_correct(&self, encoded: &Bitstream) -> bool {
        HammingCodec::decode(self, encoded)
            .map(|d| d.status != DecodeStatus::UncorrectableSuspected)
            .unwrap_or(false)
    }

    fn error_stats(&self) -> ErrorStats {
        self.last_stats
    }
}

/// Encode `data` (length a multiple of 4) with optional overall parity
pub fn hamming_encode(data: &Bitstream, extra_parity: bool) -> Result<Bitstream> {
    HammingCodec::new(extra_parity).encode(data)
}

/// Decode and correct a protected stream
pub fn hamming_decode(input: &Bitstream, extra_parity: bool) -> Result<Decoded> {
    HammingCodec::new(extra_parity).decode(input)
}

/// Strip parity positions from a protected stream
pub fn hamming_pure_decode(input: &Bitstream, extra_parity: bool) -> Result<Bitstream> {
    HammingCodec::new(extra_parity).pure_decode(input)
}

/// True when `input` is not a valid codeword sequence
pub fn hamming_check(input: &Bitstream, extra_parity: bool) -> Result<bool> {
    HammingCodec::new(extra_parity).check(input)
}

fn parse_bits(input: &str) -> Result<Bitstream> {
    input
        .parse()
        .map_err(|e: lifi_core::CoreError| FrameError::InvalidInput { msg: e.to_string() })
}

/// Block length for `data_bits`: parity bits are inserted one by one and each
/// insertion may push the next power of two inside the block.
fn hamming_len(data_bits: usize) -> usize {
    let mut len = data_bits;
    let mut parity_pos = 1;
    while parity_pos <= len {
        len += 1;
        parity_pos <<= 1;
    }
    len
}

fn parity_positions(len: usize) -> impl Iterator<Item = usize> {
    std::iter::successors(Some(1usize), |p| Some(p << 1)).take_while(move |&p| p <= len)
}

/// Even parity over the runs `[p, 2p)`, `[3p, 4p)`, ... excluding `p` itself
fn group_parity(block: &[bool], p: usize) -> bool {
    let mut parity = false;
    let mut run_start = p;
    while run_start <= block.len() {
        let run_end = (run_start + p).min(block.len() + 1);
        for pos in run_start..run_end {
            if pos != p {
                parity ^= block[pos - 1];
            }
        }
        run_start += 2 * p;
    }
    parity
}

fn encode_block(data: &[bool], extra_parity: bool) -> Vec<bool> {
    let len = hamming_len(data.len());
    let mut block = vec![false; len];

    let mut data_bits = data.iter();
    for pos in 1..=len {
        if !pos.is_power_of_two() {
            block[pos - 1] = data_bits.next().copied().unwrap_or(false);
        }
    }

    for p in parity_positions(len) {
        block[p - 1] = group_parity(&block, p);
    }

    if extra_parity {
        let overall = even_parity(&block);
        block.push(overall);
    }
    block
}

fn strip_parity(block: &[bool]) -> Vec<bool> {
    block
        .iter()
        .enumerate()
        .filter(|(i, _)| !(i + 1).is_power_of_two())
        .map(|(_, &bit)| bit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn bits(s: &str) -> Bitstream {
        s.parse().unwrap()
    }

    #[test]
    fn test_block_lengths() {
        assert_eq!(hamming_len(4), 7);
        assert_eq!(hamming_len(11), 15);
        assert_eq!(HammingCodec::new(false).block_len(), 7);
        assert_eq!(HammingCodec::new(true).block_len(), 8);
    }

    #[test]
    fn test_reference_vector() {
        let encoded = hamming_encode(&bits("1011"), false).unwrap();
        assert_eq!(encoded.to_string(), "0110011");
    }

    #[test]
    fn test_reference_vector_with_extra_parity() {
        let encoded = hamming_encode(&bits("1011"), true).unwrap();
        assert_eq!(encoded.to_string(), "01100110");
        assert_eq!(encoded.count_ones() % 2, 0);
    }

    #[test]
    fn test_every_single_flip_is_corrected() {
        let codeword = hamming_encode(&bits("1011"), false).unwrap();
        for i in 0..codeword.len() {
            let mut corrupted = codeword.clone();
            corrupted.flip(i).unwrap();

            let decoded = hamming_decode(&corrupted, false).unwrap();
            assert_eq!(decoded.data.to_string(), "1011", "flip at {}", i);
            assert_eq!(decoded.status, DecodeStatus::Corrected);
            assert!(hamming_check(&corrupted, false).unwrap());
        }
    }

    #[test]
    fn test_clean_decode() {
        let codeword = hamming_encode(&bits("10110010"), false).unwrap();
        let decoded = hamming_decode(&codeword, false).unwrap();
        assert_eq!(decoded.data.to_string(), "10110010");
        assert_eq!(decoded.status, DecodeStatus::Clean);
        assert!(!hamming_check(&codeword, false).unwrap());
        assert_eq!(hamming_pure_decode(&codeword, false).unwrap(), decoded.data);
    }

    #[test]
    fn test_extra_parity_detects_double_error() {
        let mut codeword = hamming_encode(&bits("0101"), true).unwrap();
        codeword.flip(0).unwrap();
        codeword.flip(5).unwrap();

        let decoded = hamming_decode(&codeword, true).unwrap();
        assert_eq!(decoded.status, DecodeStatus::UncorrectableSuspected);
        assert_eq!(decoded.stats.uncorrectable_errors, 1);
    }

    #[test]
    fn test_extra_parity_bit_hit_is_corrected() {
        let mut codeword = hamming_encode(&bits("0101"), true).unwrap();
        codeword.flip(7).unwrap();

        let decoded = hamming_decode(&codeword, true).unwrap();
        assert_eq!(decoded.data.to_string(), "0101");
        assert_eq!(decoded.status, DecodeStatus::Corrected);
    }

    #[test]
    fn test_extra_parity_single_flips() {
        let codeword = hamming_encode(&bits("1110"), true).unwrap();
        for i in 0..codeword.len() {
            let mut corrupted = codeword.clone();
            corrupted.flip(i).unwrap();
            let decoded = hamming_decode(&corrupted, true).unwrap();
            assert_eq!(decoded.data.to_string(), "1110", "flip at {}", i);
            assert_eq!(decoded.status, DecodeStatus::Corrected);
        }
    }

    #[test]
    fn test_invalid_input() {
        let codec = HammingCodec::new(false);
        assert!(matches!(
            codec.encode(&bits("101")),
            Err(FrameError::InvalidInput { .. })
        ));
        assert!(matches!(
            codec.encode_str("10x1"),
            Err(FrameError::InvalidInput { .. })
        ));
        assert!(matches!(
            codec.decode(&bits("0110")),
            Err(FrameError::InvalidInput { .. })
        ));
        assert!(matches!(
            codec.decode_str("011001a"),
            Err(FrameError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_fec_traits() {
        let mut codec = HammingCodec::new(true);
        assert_eq!(codec.code_rate(), 0.5);
        assert_eq!(codec.overhead_bits(8), 8);

        let mut encoded = FecEncoder::encode(&mut codec, &bits("1011")).unwrap();
        encoded.flip(2).unwrap();
        assert!(codec.can_correct(&encoded));

        let decoded = FecDecoder::decode(&mut codec, &encoded).unwrap();
        assert_eq!(decoded.data.to_string(), "1011");
        assert_eq!(codec.error_stats().corrected_errors, 1);
    }

    #[quickcheck]
    fn prop_single_flip_per_block_roundtrips(text: String, flips: Vec<u8>) -> bool {
        let printable: String = text.chars().filter(|c| (' '..='~').contains(c)).collect();
        let data = lifi_codecs::text::framer_bits(&printable);
        let codec = HammingCodec::new(false);
        let mut encoded = codec.encode(&data).unwrap();

        let block_len = codec.block_len();
        for block in 0..encoded.len() / block_len {
            if let Some(&offset) = flips.get(block) {
                let offset = offset as usize;
                if offset < block_len {
                    encoded.flip(block * block_len + offset).unwrap();
                }
            }
        }

        codec.decode(&encoded).map(|d| d.data == data).unwrap_or(false)
    }
}
