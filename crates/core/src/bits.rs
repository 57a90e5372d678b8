//! Bit stream storage and conversions

use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

/// Ordered, finite sequence of bits.
///
/// Streams are built by appending and are handed to the modulator by value,
/// after which they are no longer mutated. The textual form is a string of
/// `'0'` and `'1'` characters, first bit first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bitstream {
    bits: Vec<bool>,
}

impl Bitstream {
    /// Create an empty stream
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Create an empty stream with room for `capacity` bits
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
        }
    }

    /// Wrap an existing bit vector
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Get the number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if the stream is empty
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Get a reference to the underlying bits
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Get the bit at `index`, if any
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Iterate over the bits in order
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Append a single bit
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Append `value` as a zero-padded, MSB-first field of at least `width` bits
    pub fn push_value(&mut self, value: u32, width: usize) {
        let significant = (u32::BITS - value.leading_zeros()) as usize;
        let width = width.max(significant);
        for shift in (0..width).rev() {
            let bit = shift < u32::BITS as usize && (value >> shift) & 1 == 1;
            self.bits.push(bit);
        }
    }

    /// Append all bits of another stream
    pub fn append(&mut self, other: &Bitstream) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Invert the bit at `index`
    pub fn flip(&mut self, index: usize) -> Result<()> {
        let len = self.bits.len();
        let bit = self
            .bits
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange { index, len })?;
        *bit = !*bit;
        Ok(())
    }

    /// Split into consecutive chunks of `size` bits; the last chunk may be shorter
    pub fn chunks(&self, size: usize) -> std::slice::Chunks<'_, bool> {
        self.bits.chunks(size)
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Pack into bytes, MSB first. A trailing partial byte is zero padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |byte, (i, &bit)| if bit { byte | 1 << (7 - i) } else { byte })
            })
            .collect()
    }

    /// Unpack bytes, MSB first
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut stream = Self::with_capacity(bytes.len() * 8);
        for &byte in bytes {
            stream.push_value(byte as u32, 8);
        }
        stream
    }
}

/// Convert `value` into a zero-padded binary field of `width` bits.
///
/// Values needing more than `width` bits are emitted in full rather than
/// truncated.
pub fn to_binary(value: u32, width: usize) -> Bitstream {
    let mut stream = Bitstream::with_capacity(width);
    stream.push_value(value, width);
    stream
}

/// Even parity of a bit slice: `true` when the number of ones is odd, so that
/// appending the result makes the total count of ones even.
pub fn even_parity(bits: &[bool]) -> bool {
    bits.iter().fold(false, |acc, &b| acc ^ b)
}

impl FromStr for Bitstream {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .enumerate()
            .map(|(position, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(CoreError::InvalidInput {
                    msg: format!("non-binary character {:?} at position {}", other, position),
                }),
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::from_bits)
    }
}

impl TryFrom<String> for Bitstream {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Bitstream> for String {
    fn from(stream: Bitstream) -> Self {
        stream.to_string()
    }
}

impl fmt::Display for Bitstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl Index<usize> for Bitstream {
    type Output = bool;

    fn index(&self, index: usize) -> &Self::Output {
        &self.bits[index]
    }
}

impl FromIterator<bool> for Bitstream {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self::from_bits(iter.into_iter().collect())
    }
}

impl Extend<bool> for Bitstream {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        self.bits.extend(iter);
    }
}

impl IntoIterator for Bitstream {
    type Item = bool;
    type IntoIter = std::vec::IntoIter<bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.bits.into_iter()
    }
}
