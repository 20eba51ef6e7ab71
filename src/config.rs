//! Configuration for the keystroke daemon.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default evdev node for the keyboard.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/input/event0";

/// Default count log location.
pub const DEFAULT_LOG_PATH: &str = "/var/log/keystroked/keystrokes.log";

/// Longest window chrono can represent (`i64::MAX` milliseconds).
pub const MAX_WINDOW_SECS: u64 = i64::MAX as u64 / 1000;

/// Main configuration for the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length of each counting window
    #[serde(with = "duration_serde")]
    pub window_length: Duration,

    /// Pause between main loop ticks
    #[serde(with = "duration_serde")]
    pub tick_interval: Duration,

    /// Input device to sample
    pub device_path: PathBuf,

    /// Count log to append to
    pub log_path: PathBuf,

    /// Stay attached to the terminal instead of daemonizing
    pub foreground: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_length: Duration::from_secs(60),
            tick_interval: Duration::from_secs(1),
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            foreground: false,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }

    /// Reject settings the main loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_length.as_secs() == 0 {
            return Err(ConfigError::Invalid(
                "window length must be at least one second".to_string(),
            ));
        }
        if self.window_length.as_secs() > MAX_WINDOW_SECS {
            return Err(ConfigError::Invalid(format!(
                "window length must be at most {MAX_WINDOW_SECS} seconds"
            )));
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "tick interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
