//! Multi-level brightness modulation

use crate::common::{Level, Modulator, Symbol, TransmissionMode};
use crate::Result;
use lifi_core::Bitstream;
use tracing::debug;

/// Bit appended to an odd-length stream before pairing
pub const PAD_BIT: bool = true;

/// Two data bits per symbol, four brightness levels (`brightness_2bit`)
#[derive(Debug, Clone, Default)]
pub struct BrightnessModulator;

impl BrightnessModulator {
    /// Create a new brightness modulator
    pub fn new() -> Self {
        Self
    }
}

impl Modulator for BrightnessModulator {
    fn modulate(&mut self, bits: &Bitstream, output: &mut Vec<Symbol>) -> Result<()> {
        output.clear();

        let mut padded = bits.clone();
        if padded.len() % 2 != 0 {
            padded.push(PAD_BIT);
        }
        output.reserve(padded.len() / 2);

        for pair in padded.chunks(2) {
            let value = (u8::from(pair[0]) << 1) | u8::from(pair[1]);
            output.push(Symbol::plain(Level::from_group(value)));
        }

        debug!(
            "{} modulated {} bits ({} padded) into {} symbols",
            self.mode(),
            bits.len(),
            padded.len() - bits.len(),
            output.len()
        );
        Ok(())
    }

    fn mode(&self) -> TransmissionMode {
        TransmissionMode::Brightness2Bit
    }

    fn reset(&mut self) {
        // Stateless
    }
}

/// One data bit behind an alternating clock bit (`brightness_with_clock`)
///
/// The clock bit is the high bit of the 2-bit group, so a symbol sits in the
/// lower two levels when the clock is low and in the upper two when it is
/// high. The clock value is also reported on the side channel.
#[derive(Debug, Clone, Default)]
pub struct ClockedBrightnessModulator {
    clock: bool,
}

impl ClockedBrightnessModulator {
    /// Create a new modulator; the clock starts low
    pub fn new() -> Self {
        Self { clock: false }
    }
}

impl Modulator for ClockedBrightnessModulator {
    fn modulate(&mut self, bits: &Bitstream, output: &mut Vec<Symbol>) -> Result<()> {
        output.clear();
        output.reserve(bits.len());

        for bit in bits.iter() {
            let value = (u8::from(self.clock) << 1) | u8::from(bit);
            output.push(Symbol::clocked(Level::from_group(value), self.clock));
            self.clock = !self.clock;
        }

        debug!("{} modulated {} bits into {} symbols", self.mode(), bits.len(), output.len());
        Ok(())
    }

    fn mode(&self) -> TransmissionMode {
        TransmissionMode::BrightnessWithClock
    }

    fn reset(&mut self) {
        self.clock = false;
    }
}
