//! Link profiles stored as TOML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use lifi_modem::prelude::{LinkConfig, TransmissionMode};

use crate::tx::TxConfig;

/// Saved link settings shared by sender and receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkProfile {
    pub mode: TransmissionMode,
    pub bits_per_second: f64,
    pub hamming: bool,
    pub extra_parity: bool,
}

impl Default for LinkProfile {
    fn default() -> Self {
        Self {
            mode: TransmissionMode::Basic,
            bits_per_second: 4.0,
            hamming: false,
            extra_parity: false,
        }
    }
}

impl LinkProfile {
    /// Load a profile from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile: {:?}", path))?;

        let profile: Self = toml::from_str(&content)
            .context("Failed to parse profile")?;

        profile.link_config()?;
        Ok(profile)
    }

    /// Save the profile to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize profile")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write profile: {:?}", path))?;

        Ok(())
    }

    /// Validated link configuration
    pub fn link_config(&self) -> Result<LinkConfig> {
        LinkConfig::new(self.bits_per_second, self.mode).context("Invalid link profile")
    }

    /// Overwrite the link settings of `config` with this profile
    pub fn apply_to(&self, config: &mut TxConfig) {
        config.mode = self.mode;
        config.bits_per_second = self.bits_per_second;
        config.hamming = self.hamming;
        config.extra_parity = self.extra_parity;
    }
}

impl From<&TxConfig> for LinkProfile {
    fn from(config: &TxConfig) -> Self {
        Self {
            mode: config.mode,
            bits_per_second: config.bits_per_second,
            hamming: config.hamming,
            extra_parity: config.extra_parity,
        }
    }
}
