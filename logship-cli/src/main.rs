//! Logship CLI
//!
//! Command-line client that ships log records to a TCP collector, either
//! one at a time or in bursts for rate-limit testing.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::{ClientConfig, Config, DEFAULT_CONFIG_PATH, Overrides};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "logship")]
#[command(about = "Ship log records to a TCP log collector", long_about = None)]
struct Cli {
    /// Path to the JSON client configuration
    #[arg(long, env = "LOGSHIP_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Collector host, overrides serverIp
    #[arg(long)]
    host: Option<String>,

    /// Collector port, overrides serverPort
    #[arg(long)]
    port: Option<u16>,

    /// Give up connecting after this many milliseconds (default: no limit)
    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    /// Give up writing after this many milliseconds (default: no limit)
    #[arg(long)]
    write_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            connect_timeout_ms: self.connect_timeout_ms,
            write_timeout_ms: self.write_timeout_ms,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logship=info,logship_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let config = Config::resolve(ClientConfig::load(&cli.config), cli.overrides());
    info!("Connecting to server at {}", config.endpoint);

    let command = cli.command.unwrap_or(Commands::Interactive);
    handle_command(command, &config).await
}
