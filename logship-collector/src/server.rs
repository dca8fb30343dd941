//! Connection handling
//!
//! Each accepted connection carries at most one record: the first line is
//! read, checked against the sender's rate limit, decoded, enriched and
//! stored, then the connection is closed. Anything after the first line is
//! ignored.

use logship_core::wire::{self, DELIMITER};
use logship_core::{Clock, SystemClock};
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::entry::StoredEntry;
use crate::rate_limiter::RateLimiter;
use crate::sink::EntrySink;

/// Longest first line accepted, delimiter included
pub const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("failed to read from client: {0}")]
    Read(#[source] io::Error),

    #[error("failed to store entry: {0}")]
    Store(#[source] io::Error),
}

/// What happened to one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// The record was stored
    Stored,
    /// The client closed without sending anything
    Closed,
    /// The client sent too soon after its last accepted record
    RateLimited,
    /// The line was blank or not a valid record
    Malformed,
    /// The line exceeded [`MAX_LINE_BYTES`]
    Oversized,
    /// No complete line arrived within the read timeout
    TimedOut,
}

/// Running totals since the collector started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    pub stored: u64,
    pub rate_limited: u64,
    pub rejected: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    stored: AtomicU64,
    rate_limited: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

pub struct Collector {
    limiter: RateLimiter,
    sink: Arc<dyn EntrySink>,
    clock: Arc<dyn Clock>,
    read_timeout: Option<Duration>,
    counters: Counters,
}

impl Collector {
    pub fn new(limiter: RateLimiter, sink: Arc<dyn EntrySink>) -> Self {
        Self {
            limiter,
            sink,
            clock: Arc::new(SystemClock),
            read_timeout: None,
            counters: Counters::default(),
        }
    }

    /// Replace the clock used for `ServerTimestamp`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Give up on clients that do not finish their line in time
    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn stats(&self) -> CollectorStats {
        CollectorStats {
            stored: self.counters.stored.load(Ordering::Relaxed),
            rate_limited: self.counters.rate_limited.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Accept connections forever, one task per connection
    pub async fn serve(self: Arc<Self>, listener: TcpListener) {
        loop {
            let (mut stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let collector = Arc::clone(&self);
            tokio::spawn(async move {
                debug!("Client connected: {}", peer);

                let result = collector.handle_connection(&mut stream, peer.ip()).await;
                if let Err(e) = &result {
                    warn!("Error handling {}: {}", peer, e);
                }
                collector.count(&result);

                let _ = stream.shutdown().await;
                debug!("Client disconnected: {}", peer);
            });
        }
    }

    /// Read, check and store the first line sent by `peer`
    pub async fn handle_connection<R: AsyncRead + Unpin>(
        &self,
        reader: R,
        peer: IpAddr,
    ) -> Result<ConnectionOutcome, CollectorError> {
        let mut line = Vec::new();
        let read = read_first_line(reader, &mut line);

        let read = match self.read_timeout {
            Some(after) => match tokio::time::timeout(after, read).await {
                Ok(read) => read,
                Err(_) => {
                    warn!("Timed out waiting for {} after {:?}", peer, after);
                    return Ok(ConnectionOutcome::TimedOut);
                }
            },
            None => read.await,
        };

        if read.map_err(CollectorError::Read)? == 0 {
            return Ok(ConnectionOutcome::Closed);
        }

        if !self.limiter.check(peer, Instant::now()) {
            warn!("Rate limit triggered for {}", peer);
            return Ok(ConnectionOutcome::RateLimited);
        }

        if line.len() > MAX_LINE_BYTES {
            warn!("Line from {} exceeds {} bytes", peer, MAX_LINE_BYTES);
            return Ok(ConnectionOutcome::Oversized);
        }

        // A last line closed by EOF instead of a delimiter still counts
        if line.last() != Some(&DELIMITER) {
            line.push(DELIMITER);
        }

        let record = match wire::decode_frames(&line) {
            Ok(records) => match records.into_iter().next() {
                Some(record) => record,
                None => {
                    warn!("Blank line from {}", peer);
                    return Ok(ConnectionOutcome::Malformed);
                }
            },
            Err(e) => {
                warn!("Rejected record from {}: {}", peer, e);
                return Ok(ConnectionOutcome::Malformed);
            }
        };

        let entry = StoredEntry::new(&record, self.clock.now(), peer);
        self.sink
            .store(&entry)
            .await
            .map_err(CollectorError::Store)?;

        info!("Logged from {}: {}", peer, entry.message);
        Ok(ConnectionOutcome::Stored)
    }

    fn count(&self, result: &Result<ConnectionOutcome, CollectorError>) {
        let counter = match result {
            Ok(ConnectionOutcome::Stored) => &self.counters.stored,
            Ok(ConnectionOutcome::RateLimited) => &self.counters.rate_limited,
            Ok(ConnectionOutcome::Closed) => return,
            Ok(
                ConnectionOutcome::Malformed
                | ConnectionOutcome::Oversized
                | ConnectionOutcome::TimedOut,
            ) => &self.counters.rejected,
            Err(_) => &self.counters.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Read up to and including the first delimiter, stopping one byte past
/// [`MAX_LINE_BYTES`]
async fn read_first_line<R: AsyncRead + Unpin>(
    reader: R,
    line: &mut Vec<u8>,
) -> io::Result<usize> {
    let mut limited = BufReader::new(reader.take(MAX_LINE_BYTES as u64 + 1));
    limited.read_until(DELIMITER, line).await
}
