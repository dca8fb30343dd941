//! Configuration module
//!
//! Loads the collector address from a JSON file. A missing or unreadable
//! file never stops the client: it falls back to `127.0.0.1:13000` and says so.
//!
//! ```json
//! { "serverIp": "127.0.0.1", "serverPort": 13000 }
//! ```

use logship_client::CollectorClient;
use logship_core::Endpoint;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "clientconfig.json";

/// Why a config file could not be used
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

/// Contents of the config file
///
/// Each key falls back to its default on its own when absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub server_ip: String,
    pub server_port: u16,
    /// Absent means connect is unbounded
    pub connect_timeout_ms: Option<u64>,
    /// Absent means write is unbounded
    pub write_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_ip: Endpoint::DEFAULT_HOST.to_string(),
            server_port: Endpoint::DEFAULT_PORT,
            connect_timeout_ms: None,
            write_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Load the config file, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "{}; using defaults ({}, {})",
                    e,
                    Endpoint::DEFAULT_HOST,
                    Endpoint::DEFAULT_PORT
                );
                Self::default()
            }
        }
    }

    /// Load and validate the config file
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

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_ip.trim().is_empty() {
            return Err(ConfigError::Invalid("serverIp cannot be empty".to_string()));
        }

        if self.server_port == 0 {
            return Err(ConfigError::Invalid(
                "serverPort must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.server_ip.trim(), self.server_port)
    }
}

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Collector every record is sent to
    pub endpoint: Endpoint,
    pub connect_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

/// Command line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub connect_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
}

impl Config {
    pub fn resolve(file: ClientConfig, overrides: Overrides) -> Self {
        let mut endpoint = file.endpoint();
        if let Some(host) = overrides.host {
            endpoint.host = host;
        }
        if let Some(port) = overrides.port {
            endpoint.port = port;
        }

        Self {
            endpoint,
            connect_timeout: overrides
                .connect_timeout_ms
                .or(file.connect_timeout_ms)
                .map(Duration::from_millis),
            write_timeout: overrides
                .write_timeout_ms
                .or(file.write_timeout_ms)
                .map(Duration::from_millis),
        }
    }

    /// Build a client for the resolved endpoint
    pub fn client(&self) -> CollectorClient {
        CollectorClient::new(self.endpoint.clone())
            .with_timeouts(self.connect_timeout, self.write_timeout)
    }
}
