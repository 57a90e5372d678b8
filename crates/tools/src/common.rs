//! Common utilities and configuration for tools

use clap::Parser;
use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Global configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
pub struct GlobalConfig {
    /// Link profile (TOML) overriding the link options
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

/// Maximum log level for the given options
pub fn log_level(config: &GlobalConfig, verbose: bool) -> Result<Level> {
    if config.debug {
        return Ok(Level::DEBUG);
    }

    if let Some(level) = &config.log_level {
        return level
            .parse::<Level>()
            .with_context(|| format!("Unknown log level: {}", level));
    }

    Ok(if verbose { Level::INFO } else { Level::WARN })
}

/// Initialize logging based on configuration
pub fn init_logging(config: &GlobalConfig, verbose: bool) -> Result<()> {
    let level = log_level(config, verbose)?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Load configuration from file
pub fn load_config<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    // Try JSON first, then TOML
    if let Ok(config) = serde_json::from_str(&content) {
        return Ok(config);
    }

    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("Failed to parse config file: {}", e),
    }
}

/// Save configuration to file
pub fn save_config<T: Serialize>(config: &T, path: &Path) -> Result<()> {
    let content = if path.extension().and_then(|s| s.to_str()) == Some("json") {
        serde_json::to_string_pretty(config)?
    } else {
        toml::to_string_pretty(config)?
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    Ok(())
}
