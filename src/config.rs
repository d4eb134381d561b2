//! TOML configuration for the `modprime` binary.
//!
//! Every section and key is optional; missing values fall back to the
//! defaults below.
//!
//! ```toml
//! [fpowm]
//! block_width = 16
//!
//! [primality]
//! rounds = 30
//! seed = 42
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::fpowm::{DEFAULT_BLOCK_WIDTH, MAX_BLOCK_WIDTH};

/// Default Miller–Rabin rounds for the CLI drivers.
pub const DEFAULT_ROUNDS: u32 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fpowm: FpowmConfig,
    pub primality: PrimalityConfig,
}

/// The `[fpowm]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FpowmConfig {
    pub block_width: u32,
}

impl Default for FpowmConfig {
    fn default() -> Self {
        FpowmConfig {
            block_width: DEFAULT_BLOCK_WIDTH,
        }
    }
}

/// The `[primality]` section: witness rounds and an optional RNG seed for
/// reproducible witness bases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimalityConfig {
    pub rounds: u32,
    pub seed: Option<u64>,
}

impl Default for PrimalityConfig {
    fn default() -> Self {
        PrimalityConfig {
            rounds: DEFAULT_ROUNDS,
            seed: None,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let width = self.fpowm.block_width;
        if width == 0 || width > MAX_BLOCK_WIDTH {
            anyhow::bail!(
                "fpowm.block_width must be in 1..={}, got {}",
                MAX_BLOCK_WIDTH,
                width
            );
        }
        if self.primality.rounds == 0 {
            anyhow::bail!("primality.rounds must be at least 1");
        }
        Ok(())
    }
}
