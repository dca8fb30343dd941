//! Error types for the logship client

use logship_core::Endpoint;
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Step of a send that can time out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Connect => f.write_str("connect"),
            Stage::Write => f.write_str("write"),
        }
    }
}

/// Errors that can occur while delivering one record
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be opened (refused, unreachable, DNS failure)
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    /// Record could not be serialized
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Frame could not be written in full
    #[error("failed to write frame: {0}")]
    Write(#[source] io::Error),

    /// Connection could not be closed cleanly
    #[error("failed to close connection: {0}")]
    Close(#[source] io::Error),

    /// A configured timeout elapsed
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },
}

impl TransportError {
    /// Check if the connection was never established
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
            || matches!(
                self,
                Self::Timeout {
                    stage: Stage::Connect,
                    ..
                }
            )
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
