//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::dataflash::protocol::TEXT_PROBE_BYTES;
use crate::error::{DfLogError, Result};
use crate::reader::LogFormat;

/// Largest accepted text detection window
const MAX_PROBE_BYTES: usize = 1 << 20;

/// Accepted logging levels
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub reader: ReaderConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log decoding configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReaderConfig {
    #[serde(default)]
    pub format: LogFormat,

    #[serde(default = "default_probe_bytes")]
    pub probe_bytes: usize,
}

/// Record output configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    /// Message types to print; empty prints everything
    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub json: bool,

    /// Stop after this many messages; 0 is unlimited
    #[serde(default)]
    pub max_messages: usize,
}

/// Diagnostics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write diagnostics to a file in this directory instead of stderr
    #[serde(default)]
    pub directory: String,
}

// Default value functions
fn default_probe_bytes() -> usize { TEXT_PROBE_BYTES }
fn default_log_level() -> String { "info".to_string() }

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            probe_bytes: default_probe_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dflog::config::Config;
    ///
    /// let config = Config::load("dflog.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.reader.probe_bytes == 0 || self.reader.probe_bytes > MAX_PROBE_BYTES {
            return Err(DfLogError::Config(
                toml::de::Error::custom(format!("probe_bytes must be between 1 and {}", MAX_PROBE_BYTES))
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(DfLogError::Config(
                toml::de::Error::custom("level must be one of: trace, debug, info, warn, error")
            ));
        }

        if let Some(empty) = self.output.types.iter().position(|t| t.trim().is_empty()) {
            return Err(DfLogError::Config(
                toml::de::Error::custom(format!("output type {} is empty", empty))
            ));
        }

        Ok(())
    }
}
