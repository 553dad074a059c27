//! Configuration management for chainproof

use crate::crypto::HashAlgorithm;
use crate::error::ConfigError;
use crate::store::layout::offset_table_size;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "chainproof.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub proof: ProofConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Number of blocks per batch file; fixed for the lifetime of a store.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProofConfig {
    #[serde(default)]
    pub hash: HashAlgorithm,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_batch_size() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn from_toml(config_str: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "store.batch_size must be greater than zero".to_string(),
            ));
        }
        if offset_table_size(self.store.batch_size).is_none() {
            return Err(ConfigError::Invalid(format!(
                "store.batch_size {} is too large for an offset table",
                self.store.batch_size
            )));
        }
        if self.store.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store.data_dir must be set".to_string()));
        }
        Ok(())
    }
}

/// Load configuration from `path`, or from `chainproof.toml` in the working
/// directory. A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(path) {
        Ok(config_str) => Config::from_toml(&config_str),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
