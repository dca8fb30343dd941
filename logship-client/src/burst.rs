//! Burst driver
//!
//! Emits a fixed number of records at a fixed pace to exercise a collector's
//! rate limiting. Each record goes through [`CollectorClient::log`], so every
//! record gets its own connection. A failed send is counted and the burst
//! moves on to the next record.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::CollectorClient;

/// Records sent when the requested count is unusable
pub const DEFAULT_COUNT: u64 = 5;

/// Delay used when the requested delay is unusable
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Level stamped on every burst record
pub const BURST_LEVEL: &str = "Info";

/// Message of the `index`-th burst record, counting from 1
pub fn burst_message(index: u64) -> String {
    format!("Noisy log #{}", index)
}

/// How many records to send and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstPlan {
    pub count: u64,
    pub delay: Duration,
}

impl BurstPlan {
    pub fn new(count: u64, delay_ms: u64) -> Self {
        Self {
            count,
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Parse user-supplied text
    ///
    /// If either value is not a non-negative integer, both fall back to
    /// [`DEFAULT_COUNT`] and [`DEFAULT_DELAY_MS`].
    pub fn parse(count: &str, delay_ms: &str) -> Self {
        match (count.trim().parse::<u64>(), delay_ms.trim().parse::<u64>()) {
            (Ok(count), Ok(delay_ms)) => Self::new(count, delay_ms),
            _ => {
                warn!(
                    "Invalid input ({:?}, {:?}), defaulting to {} logs, {} ms delay",
                    count, delay_ms, DEFAULT_COUNT, DEFAULT_DELAY_MS
                );
                Self::default()
            }
        }
    }
}

impl Default for BurstPlan {
    fn default() -> Self {
        Self::new(DEFAULT_COUNT, DEFAULT_DELAY_MS)
    }
}

/// Lifecycle of a [`BurstDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstState {
    Idle,
    Emitting,
    Done,
}

/// Outcome counts of a finished burst
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BurstReport {
    pub attempted: u64,
    pub delivered: u64,
    pub failed: u64,
}

/// Sends one plan's worth of records through a client
pub struct BurstDriver<'a> {
    client: &'a CollectorClient,
    plan: BurstPlan,
    state: BurstState,
}

impl<'a> BurstDriver<'a> {
    pub fn new(client: &'a CollectorClient, plan: BurstPlan) -> Self {
        Self {
            client,
            plan,
            state: BurstState::Idle,
        }
    }

    pub fn plan(&self) -> BurstPlan {
        self.plan
    }

    pub fn state(&self) -> BurstState {
        self.state
    }

    /// Run the burst to completion
    ///
    /// Sleeps `plan.delay` between records but not after the last one. A
    /// driver runs once; calling `run` again after it finished returns an
    /// empty report.
    pub async fn run(&mut self) -> BurstReport {
        let mut report = BurstReport::default();

        if self.state != BurstState::Idle {
            debug!("Burst already ran, ignoring");
            return report;
        }

        info!(
            "Starting burst of {} log(s) to {} with {:?} delay",
            self.plan.count,
            self.client.endpoint(),
            self.plan.delay
        );

        self.state = BurstState::Emitting;

        for index in 1..=self.plan.count {
            debug!("Sending burst record {}/{}", index, self.plan.count);

            report.attempted += 1;
            match self.client.log(BURST_LEVEL, &burst_message(index)).await {
                Ok(()) => report.delivered += 1,
                Err(_) => report.failed += 1,
            }

            if index < self.plan.count && !self.plan.delay.is_zero() {
                tokio::time::sleep(self.plan.delay).await;
            }
        }

        self.state = BurstState::Done;

        info!(
            "Burst finished: {} attempted, {} delivered, {} failed",
            report.attempted, report.delivered, report.failed
        );

        report
    }
}
