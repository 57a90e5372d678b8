//! Transmitter configuration and implementation

use clap::Parser;
use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use lifi_core::Bitstream;
use lifi_frame::prelude::{Frame, FrameBuilder};
use lifi_modem::prelude::{
    modulate, CancelToken, LevelSink, LinkConfig, Scheduler, Symbol, Transmission,
    TransmissionMode, TransmissionReport,
};

/// Transmitter configuration
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "lifi-tx")]
#[command(about = "LiFi link transmitter")]
pub struct TxConfig {
    /// Input text to transmit
    #[arg(short, long)]
    pub text: Option<String>,

    /// Input file path (text file)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Transmission mode
    #[arg(short, long, default_value = "basic")]
    pub mode: TransmissionMode,

    /// Emitted symbols per second
    #[arg(short, long = "bps", default_value = "4")]
    pub bits_per_second: f64,

    /// Protect the payload with the Hamming code
    #[arg(long)]
    pub hamming: bool,

    /// Add an overall parity bit to every Hamming block
    #[arg(long)]
    pub extra_parity: bool,

    /// Write the emitted events as JSON to this file
    #[arg(long)]
    pub events_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            text: None,
            file: None,
            mode: TransmissionMode::Basic,
            bits_per_second: 4.0,
            hamming: false,
            extra_parity: false,
            events_out: None,
            verbose: false,
        }
    }
}

impl TxConfig {
    /// Link configuration described by these options
    pub fn link_config(&self) -> Result<LinkConfig> {
        LinkConfig::new(self.bits_per_second, self.mode).context("Invalid link configuration")
    }
}

/// LiFi transmitter session
pub struct Transmitter {
    config: TxConfig,
    link: LinkConfig,
    scheduler: Scheduler,
}

impl Transmitter {
    /// Create a new transmitter with the given configuration
    pub fn new(config: TxConfig) -> Result<Self> {
        let link = config.link_config()?;
        let scheduler = Scheduler::from_config(&link)?;

        if config.extra_parity && !config.hamming {
            info!("Extra parity requested without Hamming protection; ignoring");
        }

        Ok(Self {
            config,
            link,
            scheduler,
        })
    }

    pub fn config(&self) -> &TxConfig {
        &self.config
    }

    pub fn link(&self) -> &LinkConfig {
        &self.link
    }

    /// Whether a transmission from this session is still in flight
    pub fn is_busy(&self) -> bool {
        self.scheduler.is_busy()
    }

    /// Text given on the command line or read from the input file
    pub fn input_text(&self) -> Result<String> {
        if let Some(text) = &self.config.text {
            Ok(text.clone())
        } else if let Some(file) = &self.config.file {
            std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read input file: {:?}", file))
        } else {
            anyhow::bail!("Either text or file must be specified");
        }
    }

    /// Build the frame for `text`
    pub fn frame(&self, text: &str) -> Result<Frame> {
        FrameBuilder::new()
            .hamming(self.config.hamming)
            .extra_parity(self.config.extra_parity)
            .build(text)
            .context("Failed to build frame")
    }

    /// Frame bits for `text`
    pub fn frame_bits(&self, text: &str) -> Result<Bitstream> {
        Ok(self.frame(text)?.to_bitstream())
    }

    /// Encode `text` into the symbols that would be emitted, without timing
    pub fn encode(&self, text: &str) -> Result<Vec<Symbol>> {
        let bits = self.frame_bits(text)?;
        let symbols = modulate(&bits, self.link.mode)?;

        if self.config.verbose {
            println!(
                "Encoded {} bits into {} {} symbols",
                bits.len(),
                symbols.len(),
                self.link.mode
            );
        }

        Ok(symbols)
    }

    /// Encode `text` and schedule it for emission
    pub fn start(&self, text: &str, cancel: CancelToken) -> Result<Transmission> {
        let symbols = self.encode(text)?;
        info!(
            "Transmitting {} symbols in {} mode at {} bit/s",
            symbols.len(),
            self.link.mode,
            self.link.bits_per_second
        );
        Ok(self.scheduler.schedule(symbols, cancel)?)
    }

    /// Transmit `text` into `sink` in real time
    pub async fn transmit<S>(&self, text: &str, sink: &mut S, cancel: CancelToken) -> Result<TransmissionReport>
    where
        S: LevelSink + ?Sized,
    {
        let transmission = self.start(text, cancel)?;
        Ok(transmission.run(sink).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifi_modem::prelude::{Level, ModemError, TimedEvent};
    use std::io::Write;
    use std::time::Duration;

    fn levels(symbols: &[Symbol]) -> String {
        symbols
            .iter()
            .map(|s| if s.level == Level::Binary(true) { '1' } else { '0' })
            .collect()
    }

    #[test]
    fn test_tx_config_default() {
        let config = TxConfig::default();
        assert_eq!(config.mode, TransmissionMode::Basic);
        assert_eq!(config.bits_per_second, 4.0);
        assert!(!config.hamming);
        assert!(!config.extra_parity);
        assert!(config.events_out.is_none());
    }

    #[test]
    fn test_tx_config_parse() {
        let config = TxConfig::try_parse_from([
            "lifi-tx",
            "--text",
            "hi",
            "--mode",
            "brightness-2bit",
            "--bps",
            "8",
            "--hamming",
        ])
        .unwrap();
        assert_eq!(config.text.as_deref(), Some("hi"));
        assert_eq!(config.mode, TransmissionMode::Brightness2Bit);
        assert_eq!(config.bits_per_second, 8.0);
        assert!(config.hamming);

        assert!(TxConfig::try_parse_from(["lifi-tx", "--mode", "strobe"]).is_err());
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let config = TxConfig {
            bits_per_second: 0.0,
            ..TxConfig::default()
        };
        assert!(Transmitter::new(config).is_err());

        let config = TxConfig {
            bits_per_second: 1e-30,
            ..TxConfig::default()
        };
        let err = Transmitter::new(config).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ModemError>(),
            Some(ModemError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_encode_single_letter_basic() {
        let transmitter = Transmitter::new(TxConfig::default()).unwrap();
        let symbols = transmitter.encode("A").unwrap();
        assert_eq!(symbols.len(), 25);
        assert_eq!(levels(&symbols), "1111001101000001000010101");
    }

    fn transmitter_for(mode: TransmissionMode) -> Transmitter {
        Transmitter::new(TxConfig {
            mode,
            ..TxConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_encode_single_letter_brightness_2bit() {
        let symbols = transmitter_for(TransmissionMode::Brightness2Bit).encode("A").unwrap();
        let intensities: Vec<u8> = symbols.iter().map(|s| s.level.intensity()).collect();

        // 25 frame bits plus one pad bit; the last pair is reset bit and pad
        assert_eq!(
            intensities,
            vec![255, 255, 0, 255, 85, 0, 0, 85, 0, 0, 170, 170, 255]
        );
        assert!(symbols.iter().all(|s| s.clock.is_none()));
    }

    #[test]
    fn test_encode_single_letter_brightness_with_clock() {
        let transmitter = transmitter_for(TransmissionMode::BrightnessWithClock);
        let bits = transmitter.frame_bits("A").unwrap();
        let symbols = transmitter.encode("A").unwrap();
        assert_eq!(symbols.len(), 25);

        for (i, (symbol, bit)) in symbols.iter().zip(bits.iter()).enumerate() {
            let clock = i % 2 == 1;
            assert_eq!(symbol.clock, Some(clock));
            let group = (u8::from(clock) << 1) | u8::from(bit);
            assert_eq!(symbol.level, Level::from_group(group));
        }
        // Reset bit with the clock low
        assert_eq!(symbols[24].level, Level::Intensity(85));
    }

    #[test]
    fn test_encode_single_letter_clock_interleaved() {
        let symbols = transmitter_for(TransmissionMode::ClockInterleaved).encode("A").unwrap();
        assert_eq!(symbols.len(), 25);
        assert_eq!(levels(&symbols), "1111001101000001000010101");
        for (i, symbol) in symbols.iter().enumerate() {
            assert_eq!(symbol.clock, Some(i % 2 == 1));
        }
    }

    #[test]
    fn test_encode_with_hamming() {
        let config = TxConfig {
            hamming: true,
            ..TxConfig::default()
        };
        let transmitter = Transmitter::new(config).unwrap();
        let bits = transmitter.frame_bits("A").unwrap();
        // 8 start + 2 * 7 payload + 8 stop + reset
        assert_eq!(bits.len(), 31);
        assert_eq!(bits.to_string(), "1111001110011001101001000010101");
    }

    #[test]
    fn test_input_text_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "hello").unwrap();

        let config = TxConfig {
            file: Some(file.path().to_path_buf()),
            ..TxConfig::default()
        };
        let transmitter = Transmitter::new(config).unwrap();
        assert_eq!(transmitter.input_text().unwrap(), "hello");
    }

    #[test]
    fn test_input_text_missing() {
        let transmitter = Transmitter::new(TxConfig::default()).unwrap();
        assert!(transmitter.input_text().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transmit_in_real_time() {
        let transmitter = Transmitter::new(TxConfig::default()).unwrap();

        let mut events = Vec::new();
        let mut sink = |event: &TimedEvent| -> lifi_modem::Result<()> {
            events.push(*event);
            Ok(())
        };
        let report = transmitter
            .transmit("A", &mut sink, CancelToken::new())
            .await
            .unwrap();

        assert_eq!(report.emitted, 25);
        assert_eq!(report.elapsed, Duration::from_millis(250) * 25);
        assert_eq!(events.last().map(|e| e.at), Some(Duration::from_millis(6250)));
        assert!(!transmitter.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_rejected() {
        let transmitter = Transmitter::new(TxConfig::default()).unwrap();
        let _first = transmitter.start("A", CancelToken::new()).unwrap();

        let err = transmitter.start("B", CancelToken::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModemError>(),
            Some(ModemError::TransmissionInProgress)
        ));
    }
}
