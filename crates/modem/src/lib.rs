//! LiFi Modem - light-level modulation and timed emission
//!
//! This crate maps a framed bit stream to light levels for one of the four
//! transmission modes and emits those levels on a drift-compensated timer.

pub mod common;
pub mod onoff;
pub mod brightness;
pub mod scheduler;
pub mod error;

pub use error::{ModemError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        common::{modulate, modulator_for, Level, LinkConfig, Modulator, Symbol, TransmissionMode},
        onoff::OnOffModulator,
        brightness::{BrightnessModulator, ClockedBrightnessModulator},
        scheduler::{
            CancelToken, DriftCompensator, LevelSink, Scheduler, SchedulerState, TimedEvent,
            Transmission, TransmissionReport,
        },
        error::{ModemError, Result},
    };
}
