//! Session configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file (or
//! no file at all) is a valid configuration. Command-line flags override
//! values read from the file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::ConcealmentStrategy;

/// Default output sample rate in Hz (320 samples = 40 ms)
const DEFAULT_SAMPLE_RATE: u32 = 8000;

/// Errors from loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Simulated packet loss
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LossConfig {
    /// Independent drop probability per packet (0.0 - 1.0)
    #[serde(default)]
    pub rate: f64,

    /// RNG seed for reproducible runs (None = seeded from entropy)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Sequence numbers that are always dropped
    #[serde(default)]
    pub drop: Vec<u32>,
}

/// Configuration for one concealment session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Concealment strategy for the whole stream
    #[serde(default)]
    pub strategy: ConcealmentStrategy,

    /// Sample rate written to WAV output
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Largest gap the receiver will fill (None = unlimited)
    #[serde(default)]
    pub max_gap: Option<u32>,

    #[serde(default)]
    pub loss: LossConfig,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strategy: ConcealmentStrategy::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_gap: None,
            loss: LossConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: SessionConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid(
                "sample_rate must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.loss.rate) {
            return Err(ConfigError::Invalid(format!(
                "loss.rate must be between 0.0 and 1.0, got {}",
                self.loss.rate
            )));
        }

        if self.max_gap == Some(0) {
            return Err(ConfigError::Invalid(
                "max_gap must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
