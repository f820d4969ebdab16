use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crawldeck_core::{ConsoleSettings, DEFAULT_PAGE_SIZE};
use crawldeck_engine::{ApiSettings, DEFAULT_BASE_URL};
use serde::Deserialize;
use thiserror::Error;

use super::logging::LogDestination;

pub const CONFIG_FILE: &str = "crawldeck.ron";
pub const API_URL_ENV: &str = "CRAWLDECK_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub poll_interval_secs: u64,
    pub page_size: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub state_dir: PathBuf,
    pub log_to: LogDestination,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_secs: 10,
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            state_dir: PathBuf::from("."),
            log_to: LogDestination::File,
        }
    }
}

impl ConsoleConfig {
    /// Reads `path`; a missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: Self = ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map(Some)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least 1s".to_string()));
        }
        Ok(self)
    }

    pub fn with_env_override(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        self
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn console_settings(&self) -> ConsoleSettings {
        ConsoleSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            page_size: self.page_size,
            ..ConsoleSettings::default()
        }
    }
}

/// Loads `path`, falling back to defaults. The error, if any, is returned
/// for logging once the logger exists.
pub fn load_or_default(path: &Path) -> (ConsoleConfig, Option<ConfigError>) {
    let (config, error) = match ConsoleConfig::load(path) {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(err) => (ConsoleConfig::default(), Some(err)),
    };
    (
        config.with_env_override(|key| std::env::var(key).ok()),
        error,
    )
}
