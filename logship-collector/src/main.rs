//! Logship Collector
//!
//! TCP collector for logship clients. Every connection delivers one JSON
//! record line; accepted records are stamped with the arrival time and the
//! sender's address and appended to a log file. Each client IP is limited to
//! one accepted record per configured interval.

pub mod config;
pub mod entry;
pub mod rate_limiter;
pub mod server;
pub mod sink;

use anyhow::{Context, Result};
use clap::Parser;
use config::{CollectorConfig, DEFAULT_CONFIG_PATH};
use rate_limiter::RateLimiter;
use server::Collector;
use sink::FileSink;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "logship-collector")]
#[command(about = "Receive log records from logship clients", long_about = None)]
struct Cli {
    /// Path to the JSON collector configuration
    #[arg(long, env = "LOGSHIP_COLLECTOR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Port to listen on, overrides ServerPort
    #[arg(long)]
    port: Option<u16>,

    /// File to append entries to, overrides LogFilePath
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Drop clients that send nothing for this many milliseconds
    #[arg(long)]
    read_timeout_ms: Option<u64>,
}

impl Cli {
    fn apply(&self, mut config: CollectorConfig) -> CollectorConfig {
        if let Some(port) = self.port {
            config.server_port = port;
        }
        if let Some(path) = &self.log_file {
            config.log_file_path = path.clone();
        }
        if self.read_timeout_ms.is_some() {
            config.read_timeout_ms = self.read_timeout_ms;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logship_collector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.apply(CollectorConfig::load(&cli.config));

    tracing::info!("Starting logship collector...");

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr()))?;

    let sink = Arc::new(FileSink::new(&config.log_file_path));
    tracing::info!(
        "Listening on {}, writing to {}, rate limit {:?} per client",
        listener.local_addr()?,
        sink.path().display(),
        config.rate_limit()
    );

    let collector = Arc::new(
        Collector::new(RateLimiter::new(config.rate_limit()), sink)
            .with_read_timeout(config.read_timeout_ms.map(Duration::from_millis)),
    );

    tokio::select! {
        _ = Arc::clone(&collector).serve(listener) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            tracing::info!("Shutting down");
        }
    }

    let stats = collector.stats();
    tracing::info!(
        "Stored {}, rate limited {}, rejected {}, failed {}",
        stats.stored,
        stats.rate_limited,
        stats.rejected,
        stats.failed
    );

    Ok(())
}
