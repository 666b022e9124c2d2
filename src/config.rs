//! Application configuration.
//!
//! Values are layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. JSON file named by `$IMAGE_PROCESSOR_CONFIG` (missing keys keep defaults)
//! 3. `$IMAGE_PROCESSOR_URL`, `$IMAGE_PROCESSOR_TIMEOUT_SECS`,
//!    `$IMAGE_PROCESSOR_DOWNLOAD_DIR`

use crate::api::{parse_base_url, DEFAULT_BASE_URL};
use derivative::Derivative;
use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "IMAGE_PROCESSOR_CONFIG";
pub const BASE_URL_ENV: &str = "IMAGE_PROCESSOR_URL";
pub const TIMEOUT_ENV: &str = "IMAGE_PROCESSOR_TIMEOUT_SECS";
pub const DOWNLOAD_DIR_ENV: &str = "IMAGE_PROCESSOR_DOWNLOAD_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct AppConfig {
    #[derivative(Default(value = "DEFAULT_BASE_URL.to_string()"))]
    pub base_url: String,
    #[derivative(Default(value = "60"))]
    pub request_timeout_secs: u64,
    #[derivative(Default(value = "4"))]
    pub toast_seconds: u64,
    #[derivative(Default(value = "default_download_dir()"))]
    pub download_dir: PathBuf,
    #[derivative(Default(value = "default_accepted_patterns()"))]
    pub accepted_patterns: Vec<String>,
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_accepted_patterns() -> Vec<String> {
    ["*.png", "*.jpg", "*.jpeg", "*.bmp", "*.webp"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl AppConfig {
    /// Loads the configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with an injectable variable lookup.
    pub fn load_from<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match var(CONFIG_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };

        if let Some(url) = var(BASE_URL_ENV) {
            config.base_url = url.trim().to_string();
        }
        if let Some(raw) = var(TIMEOUT_ENV) {
            config.request_timeout_secs =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: TIMEOUT_ENV.to_string(),
                        value: raw.clone(),
                    })?;
        }
        if let Some(dir) = var(DOWNLOAD_DIR_ENV) {
            config.download_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_base_url(&self.base_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        for pattern in &self.accepted_patterns {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidValue {
                key: "accepted_patterns".to_string(),
                value: pattern.clone(),
            })?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_seconds)
    }

    /// Whether a file name matches one of the accepted upload patterns.
    ///
    /// An empty pattern list accepts everything.
    pub fn accepts(&self, file_name: &str) -> bool {
        if self.accepted_patterns.is_empty() {
            return true;
        }
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        self.accepted_patterns.iter().any(|pattern| {
            Pattern::new(pattern)
                .map(|p| p.matches_with(file_name, options))
                .unwrap_or(false)
        })
    }
}
