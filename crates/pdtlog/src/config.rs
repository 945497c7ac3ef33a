//! Configuration management for pdtlog.
//!
//! Loaded with figment from defaults, a TOML file and `PDTLOG_` environment
//! variables.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;
use crate::compute::ExpiryThresholds;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name used under the platform config and data directories.
const APP_DIR_NAME: &str = "pdtlog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "pdtlog.db";

/// Prefix for environment overrides, e.g. `PDTLOG_EXPIRY__OK_MONTHS=6`.
const ENV_PREFIX: &str = "PDTLOG_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PDTLOG_`, `__` between section and key)
/// 2. TOML config file at `~/.config/pdtlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Urgency band thresholds for expiry dates.
    pub expiry: ExpiryThresholds,
    /// Output configuration.
    pub output: OutputConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/pdtlog/pdtlog.db`
    pub database_path: Option<PathBuf>,
}

/// Output-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used by `list` and `show` when `--format` is not given.
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration from the default file location.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Self::figment(&config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &std::path::Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(APP_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0 < warning_months <= ok_months`.
    pub fn validate(&self) -> Result<()> {
        if self.expiry.warning_months == 0 {
            return Err(Error::ConfigValidation {
                message: "expiry.warning_months must be greater than 0".to_string(),
            });
        }

        if self.expiry.warning_months > self.expiry.ok_months {
            return Err(Error::ConfigValidation {
                message: format!(
                    "expiry.warning_months ({}) cannot be greater than expiry.ok_months ({})",
                    self.expiry.warning_months, self.expiry.ok_months
                ),
            });
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
