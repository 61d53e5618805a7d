//! Configuration management for flightplan-ingest.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "flightplan-ingest";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "messages.db";

/// Environment variable prefix. Nested keys use `__`, e.g.
/// `FPINGEST_INGEST__SHR_COLUMN=2`.
const ENV_PREFIX: &str = "FPINGEST_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FPINGEST_`)
/// 2. TOML config file at `~/.config/flightplan-ingest/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Sheet layout configuration.
    pub ingest: IngestConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/flightplan-ingest/messages.db`
    pub database_path: Option<PathBuf>,
}

/// Layout of the uploaded sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Zero-based column holding the region label.
    pub region_column: usize,
    /// Zero-based column holding the SHR telegram.
    pub shr_column: usize,
    /// Zero-based column holding the IARR report.
    pub iarr_column: Option<usize>,
    /// Whether the first record is a header row.
    pub has_headers: bool,
    /// Cell delimiter; must be a single ASCII character.
    pub delimiter: char,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            region_column: 0,
            shr_column: 1,
            // column 2 holds the IDEP telegram, which is not read
            iarr_column: Some(3),
            has_headers: false,
            delimiter: ',',
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if two roles share a column or the delimiter is
    /// unusable.
    pub fn validate(&self) -> Result<()> {
        let ingest = &self.ingest;

        if ingest.region_column == ingest.shr_column {
            return Err(Error::config_validation(format!(
                "region_column and shr_column are both {}",
                ingest.shr_column
            )));
        }

        if let Some(iarr) = ingest.iarr_column {
            if iarr == ingest.region_column || iarr == ingest.shr_column {
                return Err(Error::config_validation(format!(
                    "iarr_column ({iarr}) overlaps region_column or shr_column"
                )));
            }
        }

        if !ingest.delimiter.is_ascii() || matches!(ingest.delimiter, '"' | '\n' | '\r') {
            return Err(Error::config_validation(format!(
                "unusable delimiter {:?}",
                ingest.delimiter
            )));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
