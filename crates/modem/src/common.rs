//! Common modulation traits and link configuration

use crate::brightness::{BrightnessModulator, ClockedBrightnessModulator};
use crate::onoff::OnOffModulator;
use crate::{ModemError, Result};
use lifi_core::Bitstream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Intensity step between adjacent brightness levels (0, 85, 170, 255)
pub const INTENSITY_STEP: u8 = 85;

/// Generic modulator trait
pub trait Modulator {
    /// Modulate bits to output symbols
    fn modulate(&mut self, bits: &Bitstream, output: &mut Vec<Symbol>) -> Result<()>;

    /// Mode implemented by this modulator
    fn mode(&self) -> TransmissionMode;

    /// Get data bits carried per emitted symbol
    fn bits_per_symbol(&self) -> usize {
        self.mode().bits_per_symbol()
    }

    /// Reset modulator state
    fn reset(&mut self);
}

/// Bit-to-level mapping strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransmissionMode {
    /// One bit per symbol, on/off
    Basic,
    /// One bit per symbol, on/off, plus a square-wave clock channel
    ClockInterleaved,
    /// Two bits per symbol as four brightness levels
    #[serde(rename = "brightness_2bit")]
    Brightness2Bit,
    /// One data bit and one clock bit per symbol as four brightness levels
    BrightnessWithClock,
}

impl TransmissionMode {
    /// Every mode, in presentation order
    pub const ALL: [TransmissionMode; 4] = [
        TransmissionMode::Basic,
        TransmissionMode::ClockInterleaved,
        TransmissionMode::Brightness2Bit,
        TransmissionMode::BrightnessWithClock,
    ];

    /// Canonical mode name
    pub fn name(&self) -> &'static str {
        match self {
            TransmissionMode::Basic => "basic",
            TransmissionMode::ClockInterleaved => "clock_interleaved",
            TransmissionMode::Brightness2Bit => "brightness_2bit",
            TransmissionMode::BrightnessWithClock => "brightness_with_clock",
        }
    }

    /// Data bits consumed per emitted symbol
    pub fn bits_per_symbol(&self) -> usize {
        match self {
            TransmissionMode::Brightness2Bit => 2,
            TransmissionMode::Basic
            | TransmissionMode::ClockInterleaved
            | TransmissionMode::BrightnessWithClock => 1,
        }
    }

    /// Whether symbols carry a clock side channel
    pub fn has_clock(&self) -> bool {
        matches!(
            self,
            TransmissionMode::ClockInterleaved | TransmissionMode::BrightnessWithClock
        )
    }

    /// Whether levels are 0-255 intensities rather than on/off
    pub fn is_brightness(&self) -> bool {
        matches!(
            self,
            TransmissionMode::Brightness2Bit | TransmissionMode::BrightnessWithClock
        )
    }
}

impl fmt::Display for TransmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransmissionMode {
    type Err = ModemError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        TransmissionMode::ALL
            .into_iter()
            .find(|mode| mode.name() == normalized)
            .ok_or_else(|| ModemError::InvalidConfig {
                msg: format!("Unknown transmission mode: {}", s),
            })
    }
}

/// Output level of one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Level {
    /// On/off light state
    Binary(bool),
    /// Brightness 0-255
    Intensity(u8),
}

impl Level {
    /// Level as a 0-255 intensity; binary levels map to full off/on
    pub fn intensity(&self) -> u8 {
        match *self {
            Level::Binary(true) => u8::MAX,
            Level::Binary(false) => 0,
            Level::Intensity(value) => value,
        }
    }

    /// Brightness level for a 2-bit group value (0-3)
    pub fn from_group(value: u8) -> Self {
        Level::Intensity(value.min(3) * INTENSITY_STEP)
    }
}

/// One emitted symbol: the light level plus the optional clock side channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub level: Level,
    pub clock: Option<bool>,
}

impl Symbol {
    /// Symbol without a clock channel
    pub fn plain(level: Level) -> Self {
        Self { level, clock: None }
    }

    /// Symbol with a clock channel value
    pub fn clocked(level: Level, clock: bool) -> Self {
        Self {
            level,
            clock: Some(clock),
        }
    }
}

/// Link configuration shared by the modulator and the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub bits_per_second: f64,
    pub mode: TransmissionMode,
}

impl LinkConfig {
    /// Create a new link configuration
    pub fn new(bits_per_second: f64, mode: TransmissionMode) -> Result<Self> {
        if !bits_per_second.is_finite() || bits_per_second <= 0.0 {
            return Err(ModemError::InvalidConfig {
                msg: format!("Invalid bits per second: {}", bits_per_second),
            });
        }

        let period = Duration::try_from_secs_f64(1.0 / bits_per_second).map_err(|_| {
            ModemError::InvalidConfig {
                msg: format!("Bits per second too low: {}", bits_per_second),
            }
        })?;
        if period.is_zero() {
            return Err(ModemError::InvalidConfig {
                msg: format!("Bits per second too high: {}", bits_per_second),
            });
        }

        Ok(Self {
            bits_per_second,
            mode,
        })
    }

    /// Create a configuration from a mode name
    pub fn from_mode_name(bits_per_second: f64, mode: &str) -> Result<Self> {
        Self::new(bits_per_second, mode.parse()?)
    }

    /// Nominal time between two emitted symbols.
    ///
    /// A rate that bypassed `new` and has no representable period yields
    /// zero, which `Scheduler` rejects.
    pub fn nominal_period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.bits_per_second).unwrap_or(Duration::ZERO)
    }
}

/// Create the modulator implementing `mode`
pub fn modulator_for(mode: TransmissionMode) -> Box<dyn Modulator + Send> {
    match mode {
        TransmissionMode::Basic => Box::new(OnOffModulator::basic()),
        TransmissionMode::ClockInterleaved => Box::new(OnOffModulator::clock_interleaved()),
        TransmissionMode::Brightness2Bit => Box::new(BrightnessModulator::new()),
        TransmissionMode::BrightnessWithClock => Box::new(ClockedBrightnessModulator::new()),
    }
}

/// Modulate `bits` with a fresh modulator for `mode`
pub fn modulate(bits: &Bitstream, mode: TransmissionMode) -> Result<Vec<Symbol>> {
    let mut output = Vec::new();
    modulator_for(mode).modulate(bits, &mut output)?;
    Ok(output)
}
