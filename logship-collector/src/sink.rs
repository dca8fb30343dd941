//! Entry storage
//!
//! Accepted entries go to an [`EntrySink`]. The collector binary uses
//! [`FileSink`], which appends one JSON line per entry.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::entry::StoredEntry;

#[async_trait]
pub trait EntrySink: Send + Sync {
    /// Persist one entry
    async fn store(&self, entry: &StoredEntry) -> io::Result<()>;
}

/// Appends entries to a file as newline-delimited JSON
///
/// The file is created on first write. Writes from concurrent connections
/// are serialized so lines never interleave.
pub struct FileSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EntrySink for FileSink {
    async fn store(&self, entry: &StoredEntry) -> io::Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await
    }
}

/// Keeps entries in memory
#[cfg(test)]
#[derive(Default)]
pub struct MemorySink {
    entries: std::sync::Mutex<Vec<StoredEntry>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn entries(&self) -> Vec<StoredEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl EntrySink for MemorySink {
    async fn store(&self, entry: &StoredEntry) -> io::Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
