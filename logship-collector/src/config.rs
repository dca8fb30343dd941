//! Collector configuration
//!
//! Read from a JSON file with PascalCase keys. Any key may be left out; a
//! missing or unusable file falls back to the defaults with a warning.
//!
//! ```json
//! { "ServerPort": 13000, "LogFilePath": "logs.json", "RateLimitSeconds": 5 }
//! ```

use logship_core::Endpoint;
use serde::Deserialize;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "appsettings.json";

pub const DEFAULT_LOG_FILE: &str = "logs.json";

pub const DEFAULT_RATE_LIMIT_SECONDS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{0}' not found")]
    Missing(PathBuf),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CollectorConfig {
    /// Address to listen on
    pub bind_address: IpAddr,
    pub server_port: u16,
    /// File every accepted entry is appended to
    pub log_file_path: PathBuf,
    /// Minimum gap between two accepted records from one client IP, 0 disables
    pub rate_limit_seconds: u64,
    /// Absent means a silent client is waited on indefinitely
    pub read_timeout_ms: Option<u64>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            server_port: Endpoint::DEFAULT_PORT,
            log_file_path: PathBuf::from(DEFAULT_LOG_FILE),
            rate_limit_seconds: DEFAULT_RATE_LIMIT_SECONDS,
            read_timeout_ms: None,
        }
    }
}

impl CollectorConfig {
    /// Load the config file, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::Missing(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_file_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("LogFilePath cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Socket address to bind; port 0 asks the OS for a free port
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.server_port)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_secs(self.rate_limit_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = CollectorConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:13000".parse().unwrap());
        assert_eq!(config.log_file_path, PathBuf::from("logs.json"));
        assert_eq!(config.rate_limit(), Duration::from_secs(5));
        assert_eq!(config.read_timeout_ms, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"{"BindAddress": "127.0.0.1", "ServerPort": 5000, "LogFilePath": "/tmp/x.json", "RateLimitSeconds": 0, "ReadTimeoutMs": 1500}"#,
        );

        let config = CollectorConfig::try_load(file.path()).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.log_file_path, PathBuf::from("/tmp/x.json"));
        assert_eq!(config.rate_limit(), Duration::ZERO);
        assert_eq!(config.read_timeout_ms, Some(1500));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let file = write_config(r#"{"RateLimitSeconds": 2}"#);

        let config = CollectorConfig::try_load(file.path()).unwrap();
        assert_eq!(config.rate_limit_seconds, 2);
        assert_eq!(config.server_port, 13000);
        assert_eq!(config.log_file_path, PathBuf::from("logs.json"));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appsettings.json");

        assert!(matches!(
            CollectorConfig::try_load(&path),
            Err(ConfigError::Missing(_))
        ));
        assert_eq!(CollectorConfig::load(&path), CollectorConfig::default());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let file = write_config("{ServerPort: ");

        assert!(matches!(
            CollectorConfig::try_load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(CollectorConfig::load(file.path()), CollectorConfig::default());
    }

    #[test]
    fn test_empty_log_path_is_invalid() {
        let file = write_config(r#"{"LogFilePath": ""}"#);

        assert!(matches!(
            CollectorConfig::try_load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
