//! Shared fixtures for client tests

use async_trait::async_trait;
use logship_core::Endpoint;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncReadExt, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::transport::{CollectorStream, Connector};

/// Loopback collector that records the bytes of each accepted connection
pub struct MockCollector {
    listener: TcpListener,
}

impl MockCollector {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self { listener }
    }

    pub fn endpoint(&self) -> Endpoint {
        let addr = self.listener.local_addr().unwrap();
        Endpoint::new(addr.ip().to_string(), addr.port())
    }

    /// Accept exactly `connections` connections, reading each until EOF
    pub fn spawn(self, connections: usize) -> JoinHandle<Vec<Vec<u8>>> {
        tokio::spawn(async move {
            let mut received = Vec::with_capacity(connections);
            for _ in 0..connections {
                let (mut socket, _) = self.listener.accept().await.unwrap();
                let mut buf = Vec::new();
                socket.read_to_end(&mut buf).await.unwrap();
                received.push(buf);
            }
            received
        })
    }
}

/// What a [`ScriptedConnector`] does on every attempt
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Fail with `ConnectionRefused`
    Refuse,
    /// Never complete the connect
    Hang,
    /// Hand out a stream whose writes fail
    BrokenWrites,
    /// Hand out a stream that accepts a few bytes per write call
    Trickle,
    /// Hand out a stream whose writes never complete
    Stall,
}

/// Connector that follows a [`Script`] and records what happened
#[derive(Clone)]
pub struct ScriptedConnector {
    script: Script,
    pub attempts: Arc<AtomicUsize>,
    pub shutdowns: Arc<AtomicUsize>,
    pub written: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            attempts: Arc::new(AtomicUsize::new(0)),
            shutdowns: Arc::new(AtomicUsize::new(0)),
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _endpoint: &Endpoint) -> io::Result<CollectorStream> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Refuse => Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
            Script::Hang => std::future::pending::<io::Result<CollectorStream>>().await,
            Script::BrokenWrites => Ok(self.stream(WriteMode::Fail)),
            Script::Trickle => Ok(self.stream(WriteMode::Trickle)),
            Script::Stall => Ok(self.stream(WriteMode::Stall)),
        }
    }
}

impl ScriptedConnector {
    fn stream(&self, mode: WriteMode) -> CollectorStream {
        Box::new(ScriptedStream {
            mode,
            shutdowns: self.shutdowns.clone(),
            written: self.written.clone(),
        })
    }
}

/// Max bytes a trickling stream accepts per write call
const TRICKLE_CHUNK: usize = 3;

#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Fail,
    Trickle,
    Stall,
}

struct ScriptedStream {
    mode: WriteMode,
    shutdowns: Arc<AtomicUsize>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.mode {
            WriteMode::Fail => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))),
            // Never woken; the caller's timeout is expected to fire
            WriteMode::Stall => Poll::Pending,
            WriteMode::Trickle => {
                let n = buf.len().min(TRICKLE_CHUNK);
                self.written.lock().unwrap().extend_from_slice(&buf[..n]);
                Poll::Ready(Ok(n))
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}
