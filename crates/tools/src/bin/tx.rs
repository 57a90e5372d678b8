//! LiFi TX - transmit tool for the LiFi link

use clap::Parser;
use anyhow::Result;
use lifi_modem::prelude::CancelToken;
use lifi_tools::{export_events, init_logging, ConsoleSink, GlobalConfig, RecordingSink, TxConfig, Transmitter};

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = TxConfig::parse();
    init_logging(&GlobalConfig::default(), config.verbose)?;

    // Set some text if none provided
    if config.text.is_none() && config.file.is_none() {
        config.text = Some("Hello LiFi!".to_string());
    }

    println!("LiFi TX starting...");

    let transmitter = Transmitter::new(config)?;
    let text = transmitter.input_text()?;

    let cancel = CancelToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let report = match &transmitter.config().events_out {
        Some(path) => {
            let mut recorder = RecordingSink::new();
            let report = transmitter.transmit(&text, &mut recorder, cancel).await?;
            export_events(recorder.events(), path)?;
            report
        }
        None => {
            let mut console = ConsoleSink::stdout();
            transmitter.transmit(&text, &mut console, cancel).await?
        }
    };

    println!(
        "Transmission {}: {}/{} symbols",
        if report.cancelled { "cancelled" } else { "complete" },
        report.emitted,
        report.total
    );

    Ok(())
}
