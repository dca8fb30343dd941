//! Log record domain type

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

/// Level used when the caller leaves it blank
pub const DEFAULT_LEVEL: &str = "Info";

/// Message used when the caller leaves it blank
pub const DEFAULT_MESSAGE: &str = "Test log message";

/// Second-precision UTC with a literal `Z`, e.g. `2025-02-24T17:05:09Z`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A single log event as it travels to the collector
///
/// Fields are private: a record is fixed once built and is consumed by the
/// sender. Field names on the wire are `ClientTimestamp`, `Level` and
/// `Message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogRecord {
    client_timestamp: String,
    level: String,
    message: String,
}

impl LogRecord {
    /// Build a record stamped with the clock's current instant
    ///
    /// Blank (empty or whitespace-only) inputs fall back to [`DEFAULT_LEVEL`]
    /// and [`DEFAULT_MESSAGE`]; other inputs are trimmed. The level is not
    /// checked against [`LogLevel`](super::level::LogLevel).
    pub fn build(level: &str, message: &str, clock: &dyn Clock) -> Self {
        Self::new(
            clock.now(),
            non_blank_or(level, DEFAULT_LEVEL),
            non_blank_or(message, DEFAULT_MESSAGE),
        )
    }

    /// Create a record at an explicit instant, without default substitution
    pub fn new(
        timestamp: DateTime<Utc>,
        level: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            client_timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
            level: level.into(),
            message: message.into(),
        }
    }

    pub fn client_timestamp(&self) -> &str {
        &self.client_timestamp
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Parse `ClientTimestamp` back into an instant
    ///
    /// Returns `None` for records received from a peer that used another
    /// format.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.client_timestamp, TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

fn non_blank_or(value: &str, default: &str) -> String {
    match value.trim() {
        "" => default.to_string(),
        trimmed => trimmed.to_string(),
    }
}
