//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod burst;
mod interactive;
mod send;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Menu-driven session (default)
    Interactive,
    /// Send a single log record
    Send {
        /// Severity, e.g. Debug, Info, Warning, Error, Fatal
        #[arg(short, long, default_value = "")]
        level: String,

        /// Message text; blank sends "Test log message"
        #[arg(default_value = "")]
        message: String,
    },
    /// Send a burst of records to test rate limiting
    Burst {
        /// Number of records to send
        #[arg(short, long, default_value = "5")]
        count: String,

        /// Delay between records in milliseconds
        #[arg(short, long, default_value = "1000")]
        delay_ms: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module. Delivery failures
/// are reported, not returned: only a broken terminal ends the process with
/// an error.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The resolved configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        Commands::Interactive => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            interactive::run(&client, stdin).await
        }
        Commands::Send { level, message } => send::send_one(&client, &level, &message).await,
        Commands::Burst { count, delay_ms } => burst::send_burst(&client, &count, &delay_ms).await,
    }
}
