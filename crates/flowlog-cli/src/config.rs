//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flowlog_types::DEFAULT_MARKER;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Device used when neither a flag, the environment nor the config names one.
#[cfg(target_os = "macos")]
pub const DEFAULT_DEVICE: &str = "/dev/cu.usbserial-0001";
#[cfg(target_os = "windows")]
pub const DEFAULT_DEVICE: &str = "COM3";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Serial device path
    #[serde(default)]
    pub device: Option<String>,

    /// Stats file path
    #[serde(default)]
    pub stats_file: Option<PathBuf>,

    /// Marker preceding each bracketed value
    #[serde(default)]
    pub marker: Option<String>,

    /// File the delay time is written to
    #[serde(default)]
    pub delay_file: Option<PathBuf>,

    /// Serial read poll interval in milliseconds
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    /// Delay before reopening the device after a failure, in milliseconds
    #[serde(default)]
    pub reopen_delay_ms: Option<u64>,
}

impl Config {
    /// Get the default config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flowlog")
            .join("config.toml")
    }

    /// Load config from the default location, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`, or return default if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => {
                        debug!("Loaded config from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Failed to parse config {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Failed to read config {}: {}", path.display(), e);
                }
            }
        }
        Self::default()
    }

    /// Poll interval for serial reads, if configured.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Reopen delay after a failed cycle, if configured.
    pub fn reopen_delay(&self) -> Option<Duration> {
        self.reopen_delay_ms.map(Duration::from_millis)
    }
}

/// Resolve device from arg (or env var), then config, then the platform default
pub fn resolve_device(device: Option<String>, config: &Config) -> String {
    device
        .or_else(|| config.device.clone())
        .unwrap_or_else(|| DEFAULT_DEVICE.to_string())
}

/// Resolve stats file from arg (or env var), then config, then the data directory
pub fn resolve_stats_file(file: Option<PathBuf>, config: &Config) -> PathBuf {
    file.or_else(|| config.stats_file.clone())
        .unwrap_or_else(flowlog_store::default_stats_path)
}

/// Resolve marker from arg, then config, then the firmware default
pub fn resolve_marker(marker: Option<String>, config: &Config) -> String {
    marker
        .or_else(|| config.marker.clone())
        .unwrap_or_else(|| DEFAULT_MARKER.to_string())
}

/// Resolve delay file from arg, then config, then `arduino/time.txt`
pub fn resolve_delay_file(delay_file: Option<PathBuf>, config: &Config) -> PathBuf {
    delay_file
        .or_else(|| config.delay_file.clone())
        .unwrap_or_else(|| PathBuf::from("arduino").join("time.txt"))
}
