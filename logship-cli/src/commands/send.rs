//! Single record command

use anyhow::Result;
use colored::*;
use logship_client::CollectorClient;

/// Send one record and print the outcome
pub async fn send_one(client: &CollectorClient, level: &str, message: &str) -> Result<()> {
    match client.log(level, message).await {
        Ok(()) => println!("{} {}", "✓".green(), "Log sent".bold()),
        Err(e) => println!("{} {}", "✗ Log not delivered:".red(), e),
    }

    Ok(())
}
