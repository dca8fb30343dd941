//! Burst command

use anyhow::Result;
use colored::*;
use logship_client::{BurstDriver, BurstPlan, BurstReport, CollectorClient};

/// Parse the plan, run it, and print a summary
pub async fn send_burst(client: &CollectorClient, count: &str, delay_ms: &str) -> Result<()> {
    let plan = BurstPlan::parse(count, delay_ms);
    let report = BurstDriver::new(client, plan).run().await;
    print_report(&report);

    Ok(())
}

fn print_report(report: &BurstReport) {
    let failed = if report.failed > 0 {
        report.failed.to_string().red()
    } else {
        report.failed.to_string().normal()
    };

    println!(
        "{} {} sent, {} delivered, {} failed",
        "Burst complete:".bold(),
        report.attempted,
        report.delivered.to_string().green(),
        failed
    );
}
