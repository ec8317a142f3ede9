//! Configuration file parsing and structures.
//!
//! fressnapfd uses TOML for declarative configuration: one `[trackers.<name>]`
//! section per device, plus logging and the optional read-only HTTP API.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing_subscriber::filter::LevelFilter;

/// Top-level configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Read-only HTTP API exposing current sensor values
    #[serde(default)]
    pub api: Option<ApiConfig>,

    /// Trackers to poll, keyed by a local name (e.g. the pet's name)
    pub trackers: HashMap<String, TrackerConfig>,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,
}

/// HTTP API configuration
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// IP address to listen on
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Credentials and polling behaviour for one tracker
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Device serial number
    pub serial_number: u64,

    /// Per-device token, passed as a query parameter
    pub device_token: String,

    /// Account token, passed in the authorization header
    pub auth_token: String,

    /// Seconds between polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Weight-history entries exposed as sensor attributes; 0 keeps all
    #[serde(default = "default_weight_history_depth")]
    pub weight_history_depth: usize,

    /// API host override, for tests and self-hosted proxies
    #[serde(default)]
    pub base_url: Option<String>,
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

fn default_true() -> bool {
    true
}

fn default_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8470
}

fn default_poll_interval() -> u64 {
    300
}

fn default_weight_history_depth() -> usize {
    5
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        toml::from_str(&contents).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [trackers.milo]
            serial_number = 70070
            device_token = "devtoken"
            auth_token = "authtoken"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.api.is_none());

        let milo = config.trackers.get("milo").unwrap();
        assert_eq!(milo.serial_number, 70070);
        assert_eq!(milo.poll_interval(), Duration::from_secs(300));
        assert_eq!(milo.weight_history_depth, 5);
        assert!(milo.base_url.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [logging]
            level = "debug"

            [api]
            listen = "0.0.0.0"
            port = 9000

            [trackers.milo]
            serial_number = 70070
            device_token = "devtoken"
            auth_token = "authtoken"
            poll_interval_seconds = 60
            weight_history_depth = 0

            [trackers.luna]
            serial_number = 70071
            device_token = "other"
            auth_token = "authtoken"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);

        let api = config.api.as_ref().unwrap();
        assert!(api.enabled);
        assert_eq!(api.listen, "0.0.0.0");
        assert_eq!(api.port, 9000);

        assert_eq!(config.trackers.len(), 2);
        let milo = config.trackers.get("milo").unwrap();
        assert_eq!(milo.poll_interval(), Duration::from_secs(60));
        assert_eq!(milo.weight_history_depth, 0);
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let toml = r#"
            [trackers.milo]
            serial_number = 70070
        "#;

        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
                [trackers.milo]
                serial_number = 70070
                device_token = "devtoken"
                auth_token = "authtoken"
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.trackers.len(), 1);
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/fressnapfd.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }
}
