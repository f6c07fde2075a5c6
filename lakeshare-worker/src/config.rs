//! Worker process configuration.
//!
//! Read from a TOML file whose path is the first command-line argument or
//! `LAKESHARE_CONFIG`. Every key is optional.

use lakeshare_cloud::CloudConfig;
use lakeshare_sharing::SharingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file when no argument is given.
pub const CONFIG_ENV: &str = "LAKESHARE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// DuckDB file holding share metadata and the task queue.
    pub store_path: PathBuf,

    /// Seconds between task queue polls.
    pub poll_interval_secs: u64,

    /// Maximum tasks executed per poll.
    pub batch_size: usize,

    pub cloud: CloudConfig,

    pub sharing: SharingConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("lakeshare.duckdb"),
            poll_interval_secs: 10,
            batch_size: 10,
            cloud: CloudConfig::default(),
            sharing: SharingConfig::default(),
        }
    }
}

impl WorkerConfig {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Config file named by `arg`, else by `env`, else the defaults.
    pub fn resolve(arg: Option<String>, env: Option<String>) -> Result<Self, ConfigError> {
        match arg.or(env) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
