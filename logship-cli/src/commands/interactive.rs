//! Interactive menu
//!
//! Reads choices line by line from any buffered async reader so the session
//! can be driven from stdin or from a byte slice in tests. End of input ends
//! the session as if "Exit" had been chosen, including in the middle of a
//! manual entry or burst prompt; nothing is sent in that case.

use anyhow::{Context, Result};
use colored::*;
use logship_client::{BurstDriver, BurstPlan, CollectorClient};
use logship_core::LogLevel;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// Menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Manual,
    Noisy,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Manual),
            "2" => Some(MenuChoice::Noisy),
            "3" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

/// Line-oriented prompt over an async reader
struct Prompt<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
    fn new(input: R) -> Self {
        Self {
            lines: input.lines(),
        }
    }

    /// Print `question` and read one line; `None` at end of input
    async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        print!("{}", question);
        std::io::stdout().flush().context("Failed to flush stdout")?;

        self.lines
            .next_line()
            .await
            .context("Failed to read from input")
    }
}

/// Whether the menu should be shown again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Session {
    Continue,
    Ended,
}

/// Run the menu until the user exits or input ends
pub async fn run<R: AsyncBufRead + Unpin>(client: &CollectorClient, input: R) -> Result<()> {
    let mut prompt = Prompt::new(input);

    loop {
        print_menu();

        let Some(choice) = prompt.ask("Choose an option: ").await? else {
            println!();
            break;
        };

        let session = match MenuChoice::parse(&choice) {
            Some(MenuChoice::Manual) => manual_entry(client, &mut prompt).await?,
            Some(MenuChoice::Noisy) => noisy_logs(client, &mut prompt).await?,
            Some(MenuChoice::Exit) => Session::Ended,
            None => {
                println!("{}", "Invalid choice. Please try again.".yellow());
                Session::Continue
            }
        };

        if session == Session::Ended {
            break;
        }
    }

    println!("{}", "Exiting client.".dimmed());
    Ok(())
}

fn print_menu() {
    println!();
    println!("{}", "========== LOGSHIP CLIENT ==========".bold());
    println!("  {} Manual Log Entry", "[1]".cyan());
    println!("  {} Noisy Logs (Test Rate Limiting)", "[2]".cyan());
    println!("  {} Exit", "[3]".cyan());
}

/// Prompt for a level and message and send one record
async fn manual_entry<R: AsyncBufRead + Unpin>(
    client: &CollectorClient,
    prompt: &mut Prompt<R>,
) -> Result<Session> {
    let levels = LogLevel::ALL
        .iter()
        .map(LogLevel::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let Some(level) = prompt
        .ask(&format!("Enter log level ({}): ", levels))
        .await?
    else {
        return Ok(Session::Ended);
    };
    let Some(message) = prompt.ask("Enter log message: ").await? else {
        return Ok(Session::Ended);
    };

    // Failures are already reported by the client
    let _ = client.log(&level, &message).await;

    Ok(Session::Continue)
}

/// Prompt for a count and delay and run a burst
async fn noisy_logs<R: AsyncBufRead + Unpin>(
    client: &CollectorClient,
    prompt: &mut Prompt<R>,
) -> Result<Session> {
    let Some(count) = prompt
        .ask("How many logs do you want to send? (e.g. 5): ")
        .await?
    else {
        return Ok(Session::Ended);
    };
    let Some(delay_ms) = prompt
        .ask("Enter the delay in milliseconds between logs (e.g. 500): ")
        .await?
    else {
        return Ok(Session::Ended);
    };

    let report = BurstDriver::new(client, BurstPlan::parse(&count, &delay_ms))
        .run()
        .await;

    println!(
        "{} {}/{} delivered",
        "Burst complete:".bold(),
        report.delivered,
        report.attempted
    );

    Ok(Session::Continue)
}
