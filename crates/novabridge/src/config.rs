//! NovaBridge configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use novabridge_hid::{CommandProfile, DeviceMatch};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// NovaBridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sonar: SonarConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Which HID interfaces count as a base station
    #[serde(default)]
    pub device: DeviceMatch,
    /// Firmware-dependent reports and commands
    #[serde(default)]
    pub profile: CommandProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Sonar connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SonarConfig {
    /// `coreProps.json` location (optional, uses the GG default if not set)
    pub core_props_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// GG uses a self-signed certificate for its TLS endpoint
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

impl SonarConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for SonarConfig {
    fn default() -> Self {
        Self {
            core_props_path: None,
            request_timeout_ms: default_request_timeout_ms(),
            accept_invalid_certs: true,
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

/// Preset database settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database path (optional, uses the GG default if not set)
    pub path: Option<PathBuf>,
}

/// Load configuration from `path`, or from the default location when `None`.
/// A missing file yields the defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(config_path) = path.map(Path::to_path_buf).or_else(config_path) else {
        info!("No config directory available, using defaults");
        return Ok(Config::default());
    };

    if !config_path.exists() {
        info!(?config_path, "Config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&config_path)
        .map_err(|source| Error::ConfigRead { path: config_path.clone(), source })?;
    toml::from_str(&content).map_err(|source| Error::ConfigParse { path: config_path, source })
}

/// Default configuration file path.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "novabridge", "NovaBridge")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
