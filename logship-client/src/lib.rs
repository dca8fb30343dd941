//! Logship Client
//!
//! Ships structured log records to a remote collector, one connection per
//! record.
//!
//! Every call to [`CollectorClient::send`] opens a fresh connection, writes a
//! single newline-terminated JSON record, and closes the connection again.
//! There is no pooling, batching, acknowledgement or retry: a failed send is
//! reported to the caller and the caller moves on.
//!
//! # Example
//!
//! ```no_run
//! use logship_client::CollectorClient;
//! use logship_core::Endpoint;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = CollectorClient::new(Endpoint::new("127.0.0.1", 13000));
//!
//!     if let Err(e) = client.log("Warning", "disk 90% full").await {
//!         eprintln!("not delivered: {}", e);
//!     }
//! }
//! ```

pub mod burst;
pub mod error;
pub mod transport;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use burst::{BurstDriver, BurstPlan, BurstReport, BurstState};
pub use error::{Result, Stage, TransportError};
pub use transport::{CollectorStream, Connector, TcpConnector};

use logship_core::wire;
use logship_core::{Clock, Endpoint, LogLevel, LogRecord, SystemClock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Client for a single log collector
///
/// Cloning is cheap; clones share the connector and clock.
#[derive(Clone)]
pub struct CollectorClient {
    /// Collector to send to, fixed for the client's lifetime
    endpoint: Endpoint,
    /// Opens a new connection per record
    connector: Arc<dyn Connector>,
    /// Stamps records built through [`CollectorClient::log`]
    clock: Arc<dyn Clock>,
    connect_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl CollectorClient {
    /// Create a client that connects over plain TCP using the system clock
    ///
    /// Connect and write are unbounded until [`with_timeouts`] is used.
    ///
    /// [`with_timeouts`]: CollectorClient::with_timeouts
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_connector(endpoint, Arc::new(TcpConnector))
    }

    /// Create a client with a custom connector
    ///
    /// This allows you to wrap the transport, e.g. to observe connection
    /// attempts in tests.
    pub fn with_connector(endpoint: Endpoint, connector: Arc<dyn Connector>) -> Self {
        Self {
            endpoint,
            connector,
            clock: Arc::new(SystemClock),
            connect_timeout: None,
            write_timeout: None,
        }
    }

    /// Replace the clock used to stamp records
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bound the connect and write steps of every send
    ///
    /// `None` leaves that step unbounded.
    pub fn with_timeouts(
        mut self,
        connect_timeout: Option<Duration>,
        write_timeout: Option<Duration>,
    ) -> Self {
        self.connect_timeout = connect_timeout;
        self.write_timeout = write_timeout;
        self
    }

    /// Get the collector endpoint
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Get the clock used to stamp records
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // =============================================================================
    // Sending
    // =============================================================================

    /// Build a record from `level` and `message` and send it
    ///
    /// Outcomes are logged here; the error is still returned so the caller
    /// can count failures.
    pub async fn log(&self, level: &str, message: &str) -> Result<()> {
        let record = LogRecord::build(level, message, self.clock());

        if !LogLevel::is_known(record.level()) {
            debug!("Forwarding unrecognised level {:?}", record.level());
        }

        let summary = record.message().to_string();
        match self.send(record).await {
            Ok(()) => {
                info!("Log sent successfully: {}", summary);
                Ok(())
            }
            Err(e) => {
                warn!("Error sending log to {}: {}", self.endpoint, e);
                Err(e)
            }
        }
    }

    /// Deliver one record over a new connection
    ///
    /// The connection is shut down on every path once it has been opened,
    /// including after a failed write. Success means the whole frame was
    /// written and the close completed.
    pub async fn send(&self, record: LogRecord) -> Result<()> {
        let mut stream = self.open().await?;

        let written = self.write_frame(&mut stream, &record).await;
        let closed = stream.shutdown().await.map_err(TransportError::Close);
        drop(stream);

        written?;
        closed
    }

    async fn open(&self) -> Result<CollectorStream> {
        let connect = self.connector.connect(&self.endpoint);

        let result = match self.connect_timeout {
            Some(after) => tokio::time::timeout(after, connect)
                .await
                .map_err(|_| TransportError::Timeout {
                    stage: Stage::Connect,
                    after,
                })?,
            None => connect.await,
        };

        result.map_err(|source| TransportError::Connect {
            endpoint: self.endpoint.clone(),
            source,
        })
    }

    async fn write_frame(&self, stream: &mut CollectorStream, record: &LogRecord) -> Result<()> {
        let frame = wire::encode_frame(record)?;

        let write = async {
            stream.write_all(&frame).await?;
            stream.flush().await
        };

        let result = match self.write_timeout {
            Some(after) => {
                tokio::time::timeout(after, write)
                    .await
                    .map_err(|_| TransportError::Timeout {
                        stage: Stage::Write,
                        after,
                    })?
            }
            None => write.await,
        };

        result.map_err(TransportError::Write)
    }
}

impl fmt::Debug for CollectorClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorClient")
            .field("endpoint", &self.endpoint)
            .field("connect_timeout", &self.connect_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockCollector, Script, ScriptedConnector};
    use chrono::{TimeZone, Utc};
    use logship_core::FixedClock;
    use logship_core::wire::decode_frames;

    fn fixed_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 2, 24, 8, 15, 0).unwrap(),
        ))
    }

    fn scripted(script: Script) -> (CollectorClient, ScriptedConnector) {
        let connector = ScriptedConnector::new(script);
        let client =
            CollectorClient::with_connector(Endpoint::default(), Arc::new(connector.clone()))
                .with_clock(fixed_clock());
        (client, connector)
    }

    #[test]
    fn test_client_creation() {
        let client = CollectorClient::new(Endpoint::new("10.0.0.5", 5000));
        assert_eq!(client.endpoint(), &Endpoint::new("10.0.0.5", 5000));
    }

    #[test]
    fn test_debug_hides_connector() {
        let client = CollectorClient::new(Endpoint::default());
        let debug = format!("{:?}", client);
        assert!(debug.contains("127.0.0.1"));
        assert!(debug.contains(".."));
    }

    #[tokio::test]
    async fn test_send_delivers_one_framed_record() {
        let collector = MockCollector::bind().await;
        let client = CollectorClient::new(collector.endpoint()).with_clock(fixed_clock());
        let received = collector.spawn(1);

        let record = LogRecord::build("Error", "disk full", client.clock());
        client.send(record.clone()).await.unwrap();

        let received = received.await.unwrap();
        assert_eq!(received.len(), 1);

        let bytes = &received[0];
        assert_eq!(bytes.iter().filter(|b| **b == b'\n').count(), 1);
        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(decode_frames(bytes).unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_each_send_uses_new_connection() {
        let collector = MockCollector::bind().await;
        let client = CollectorClient::new(collector.endpoint());
        let received = collector.spawn(2);

        client.log("Info", "first").await.unwrap();
        client.log("Info", "second").await.unwrap();

        let received = received.await.unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(decode_frames(&received[0]).unwrap()[0].message(), "first");
        assert_eq!(decode_frames(&received[1]).unwrap()[0].message(), "second");
    }

    #[tokio::test]
    async fn test_log_substitutes_defaults() {
        let collector = MockCollector::bind().await;
        let client = CollectorClient::new(collector.endpoint()).with_clock(fixed_clock());
        let received = collector.spawn(1);

        client.log(" ", "").await.unwrap();

        let records = decode_frames(&received.await.unwrap()[0]).unwrap();
        assert_eq!(records[0].level(), "Info");
        assert_eq!(records[0].message(), "Test log message");
        assert_eq!(records[0].client_timestamp(), "2025-02-24T08:15:00Z");
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        let (client, connector) = scripted(Script::Refuse);

        let err = client.log("Info", "lost").await.unwrap_err();

        assert!(matches!(err, TransportError::Connect { .. }));
        assert_eq!(connector.attempts(), 1);
        assert_eq!(connector.shutdowns(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_still_closes() {
        let (client, connector) = scripted(Script::BrokenWrites);

        let record = LogRecord::build("Info", "reset", client.clock());
        let err = client.send(record).await.unwrap_err();

        assert!(matches!(err, TransportError::Write(_)));
        assert_eq!(connector.shutdowns(), 1);
    }

    #[tokio::test]
    async fn test_partial_writes_are_completed() {
        let (client, connector) = scripted(Script::Trickle);

        let record = LogRecord::build("Debug", "a message longer than one chunk", client.clock());
        let expected = wire::encode_frame(&record).unwrap();
        client.send(record).await.unwrap();

        assert_eq!(connector.written(), expected);
        assert_eq!(connector.shutdowns(), 1);
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        let (client, connector) = scripted(Script::Hang);
        let client = client.with_timeouts(Some(Duration::from_millis(50)), None);

        let record = LogRecord::build("Info", "stuck", client.clock());
        let err = client.send(record).await.unwrap_err();

        assert!(matches!(
            err,
            TransportError::Timeout {
                stage: Stage::Connect,
                ..
            }
        ));
        assert!(err.is_connect());
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn test_write_timeout_still_closes() {
        let (client, connector) = scripted(Script::Stall);
        let client = client.with_timeouts(None, Some(Duration::from_millis(30)));

        let record = LogRecord::build("Info", "slow reader", client.clock());
        let err = client.send(record).await.unwrap_err();

        assert!(matches!(
            err,
            TransportError::Timeout {
                stage: Stage::Write,
                ..
            }
        ));
        assert!(!err.is_connect());
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "write timed out after 30ms");
        assert_eq!(connector.attempts(), 1);
        assert_eq!(connector.shutdowns(), 1);
    }

    #[tokio::test]
    async fn test_refused_against_real_port() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = CollectorClient::new(Endpoint::new("127.0.0.1", port));

        let err = client.log("Info", "nobody home").await.unwrap_err();
        assert!(err.is_connect());
    }
}
