//! Stored log entry
//!
//! A received [`LogRecord`] enriched with the time it arrived and the
//! address it came from. This is the line format of the collector's log
//! file.

use chrono::{DateTime, SecondsFormat, Utc};
use logship_core::LogRecord;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoredEntry {
    /// As sent by the client, not re-validated
    pub client_timestamp: String,
    /// RFC 3339 UTC with milliseconds, e.g. `2025-02-24T17:05:09.120Z`
    pub server_timestamp: String,
    pub client_ip: String,
    pub level: String,
    pub message: String,
}

impl StoredEntry {
    pub fn new(record: &LogRecord, received_at: DateTime<Utc>, client: IpAddr) -> Self {
        Self {
            client_timestamp: record.client_timestamp().to_string(),
            server_timestamp: received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            client_ip: client.to_string(),
            level: record.level().to_string(),
            message: record.message().to_string(),
        }
    }
}
