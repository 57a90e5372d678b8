//! Display sinks for emitted symbols

use anyhow::{Context, Result};
use chrono::Local;
use std::io::{self, Write};
use std::path::Path;

use lifi_modem::prelude::{Level, LevelSink, ModemError, Symbol, TimedEvent};

/// Short human readable form of a symbol
pub fn describe_symbol(symbol: &Symbol) -> String {
    let level = match symbol.level {
        Level::Binary(true) => "ON ".to_string(),
        Level::Binary(false) => "OFF".to_string(),
        Level::Intensity(value) => format!("{:3}", value),
    };

    match symbol.clock {
        Some(clock) => format!("{} clk={}", level, u8::from(clock)),
        None => level,
    }
}

/// Prints every event with a wall clock timestamp
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> LevelSink for ConsoleSink<W> {
    fn present(&mut self, event: &TimedEvent) -> lifi_modem::Result<()> {
        writeln!(
            self.out,
            "[{}] #{:<4} +{:>8.3}s  {}",
            Local::now().format("%H:%M:%S%.3f"),
            event.index,
            event.at.as_secs_f64(),
            describe_symbol(&event.symbol)
        )
        .map_err(|e| ModemError::Sink { msg: e.to_string() })
    }
}

/// Keeps every event for later export
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<TimedEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TimedEvent> {
        self.events
    }
}

impl LevelSink for RecordingSink {
    fn present(&mut self, event: &TimedEvent) -> lifi_modem::Result<()> {
        self.events.push(*event);
        Ok(())
    }
}

/// Write events as a JSON array
pub fn export_events(events: &[TimedEvent], path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(events)
        .context("Failed to serialize events")?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write events: {:?}", path))?;
    Ok(())
}
