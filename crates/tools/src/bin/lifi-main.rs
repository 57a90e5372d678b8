//! LiFi - link sender for optical text transmission
//!
//! This is the main entry point for encoding and transmitting frames

use clap::{Parser, Subcommand};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use lifi_frame::prelude::markers;
use lifi_modem::prelude::{CancelToken, LevelSink, LinkConfig, Symbol, TimedEvent, TransmissionMode};
use lifi_tools::{
    describe_symbol, export_events, init_logging, ConsoleSink, GlobalConfig, LinkProfile,
    RecordingSink, Transmitter, TxConfig,
};

/// LiFi link sender
#[derive(Parser)]
#[command(name = "lifi")]
#[command(about = "Encode text into light levels and emit them on a timer")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transmit text in real time
    Tx(TxConfig),
    /// Print the frame and symbols without emitting them
    Encode(EncodeConfig),
    /// Show modes and frame layout
    Info,
}

/// Dry run configuration
#[derive(Parser, Clone)]
pub struct EncodeConfig {
    #[command(flatten)]
    pub tx: TxConfig,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct EncodeOutput<'a> {
    link: &'a LinkConfig,
    frame_bits: String,
    symbols: &'a [Symbol],
}

/// Apply the global profile, if any, to a transmitter configuration
fn resolve(global: &GlobalConfig, mut config: TxConfig) -> Result<TxConfig> {
    if let Some(path) = &global.config {
        let profile = LinkProfile::from_file(path)?;
        info!("Using link profile {:?}", path);
        profile.apply_to(&mut config);
    }
    Ok(config)
}

async fn run_tx(config: TxConfig) -> Result<()> {
    let transmitter = Transmitter::new(config)?;
    let text = transmitter.input_text()?;

    let cancel = CancelToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping transmission");
            ctrl_c.cancel();
        }
    });

    let mut console = ConsoleSink::stdout();
    let mut recorder = RecordingSink::new();
    let mut sink = |event: &TimedEvent| -> lifi_modem::Result<()> {
        recorder.present(event)?;
        console.present(event)
    };

    let report = transmitter.transmit(&text, &mut sink, cancel).await?;

    if let Some(path) = &transmitter.config().events_out {
        export_events(recorder.events(), path)?;
        println!("✓ Events written to {:?}", path);
    }

    if report.cancelled {
        println!(
            "✗ Transmission cancelled after {}/{} symbols",
            report.emitted, report.total
        );
    } else {
        println!(
            "✓ Transmission complete: {} symbols in {:.2}s ({} display failures)",
            report.emitted,
            report.elapsed.as_secs_f64(),
            report.sink_failures
        );
    }
    Ok(())
}

fn run_encode(config: EncodeConfig) -> Result<()> {
    let transmitter = Transmitter::new(config.tx)?;
    let text = transmitter.input_text()?;
    let bits = transmitter.frame_bits(&text)?;
    let symbols = transmitter.encode(&text)?;

    if config.json {
        let output = EncodeOutput {
            link: transmitter.link(),
            frame_bits: bits.to_string(),
            symbols: &symbols,
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Frame ({} bits):", bits.len());
    for chunk in bits.chunks(8) {
        let group: String = chunk.iter().map(|&b| if b { '1' } else { '0' }).collect();
        print!("{} ", group);
    }
    println!();

    let link = transmitter.link();
    println!(
        "\nSymbols ({} in {} mode, {:.2}s at {} bit/s):",
        symbols.len(),
        link.mode,
        link.nominal_period().as_secs_f64() * symbols.len() as f64,
        link.bits_per_second
    );
    for (i, symbol) in symbols.iter().enumerate() {
        println!("  #{:<4} {}", i, describe_symbol(symbol));
    }
    Ok(())
}

/// Show system capabilities
fn show_info() {
    println!("\n=== LiFi Link Sender ===");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));

    println!("\n=== Transmission Modes ===");
    for mode in TransmissionMode::ALL {
        println!(
            "  • {:<22} {} bit(s)/symbol, {}{}",
            mode.name(),
            mode.bits_per_symbol(),
            if mode.is_brightness() { "4 brightness levels" } else { "on/off" },
            if mode.has_clock() { ", clock channel" } else { "" }
        );
    }

    println!("\n=== Frame Layout ===");
    println!("  start marker  {:08b}", markers::START);
    println!("  payload       UTF-8 bytes, optionally Hamming(7,4) protected");
    println!("  stop marker   {:08b}", markers::STOP);
    println!("  reset bit     {}", u8::from(markers::RESET_BIT));

    println!("\n=== Example Usage ===");
    println!("  Transmit: lifi tx -t \"Hello\" --mode clock-interleaved --bps 10");
    println!("  Encode:   lifi encode -t \"Hello\" --hamming --extra-parity --json");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Tx(config) => config.verbose,
        Commands::Encode(config) => config.tx.verbose,
        Commands::Info => false,
    };
    init_logging(&cli.global, verbose)?;

    info!("LiFi link sender starting");

    match cli.command {
        Commands::Tx(config) => {
            let config = resolve(&cli.global, config)?;
            info!("Starting transmission in {} mode", config.mode);
            run_tx(config).await?;
        }

        Commands::Encode(mut config) => {
            config.tx = resolve(&cli.global, config.tx)?;
            run_encode(config)?;
        }

        Commands::Info => {
            show_info();
        }
    }

    Ok(())
}
