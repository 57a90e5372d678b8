//! On-off keying: one bit per symbol, optionally with a clock channel

use crate::common::{Level, Modulator, Symbol, TransmissionMode};
use crate::Result;
use lifi_core::Bitstream;
use tracing::debug;

/// On-off modulator (`basic` and `clock_interleaved` modes)
#[derive(Debug, Clone)]
pub struct OnOffModulator {
    with_clock: bool,
    clock: bool,
}

impl OnOffModulator {
    /// Plain on/off keying
    pub fn basic() -> Self {
        Self {
            with_clock: false,
            clock: false,
        }
    }

    /// On/off keying with a clock that toggles every symbol, starting low
    pub fn clock_interleaved() -> Self {
        Self {
            with_clock: true,
            clock: false,
        }
    }
}

impl Modulator for OnOffModulator {
    fn modulate(&mut self, bits: &Bitstream, output: &mut Vec<Symbol>) -> Result<()> {
        output.clear();
        output.reserve(bits.len());

        for bit in bits.iter() {
            let level = Level::Binary(bit);
            if self.with_clock {
                output.push(Symbol::clocked(level, self.clock));
                self.clock = !self.clock;
            } else {
                output.push(Symbol::plain(level));
            }
        }

        debug!("{} modulated {} bits into {} symbols", self.mode(), bits.len(), output.len());
        Ok(())
    }

    fn mode(&self) -> TransmissionMode {
        if self.with_clock {
            TransmissionMode::ClockInterleaved
        } else {
            TransmissionMode::Basic
        }
    }

    fn reset(&mut self) {
        self.clock = false;
    }
}
