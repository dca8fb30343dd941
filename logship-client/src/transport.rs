//! Connection primitives
//!
//! The client opens a brand new stream for every record through a
//! [`Connector`]. Production code uses [`TcpConnector`]; tests substitute
//! connectors that count attempts or fail on purpose.

use async_trait::async_trait;
use logship_core::Endpoint;
use std::io;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;

/// Writable half of an open collector connection
pub type CollectorStream = Box<dyn AsyncWrite + Unpin + Send>;

/// Opens connections to a collector
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection to `endpoint`
    async fn connect(&self, endpoint: &Endpoint) -> io::Result<CollectorStream>;
}

/// Plain TCP connector
///
/// Opens a tokio `TcpStream` to the endpoint. No timeout is applied here.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, endpoint: &Endpoint) -> io::Result<CollectorStream> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
        Ok(Box::new(stream))
    }
}
