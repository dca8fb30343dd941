//! Per-client rate limiting
//!
//! Each client IP may have one record accepted per interval. A rejected
//! record does not move the window, so a client that keeps sending is let
//! through again as soon as the interval since its last accepted record
//! has passed.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Forget clients once this many are tracked and their windows have passed
const PRUNE_THRESHOLD: usize = 4096;

pub struct RateLimiter {
    interval: Duration,
    last_accepted: Mutex<HashMap<IpAddr, Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether a record from `client` arriving at `now` is accepted
    ///
    /// The first record from a client is always accepted.
    pub fn check(&self, client: IpAddr, now: Instant) -> bool {
        if self.interval.is_zero() {
            return true;
        }

        let mut last_accepted = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let within_window = last_accepted
            .get(&client)
            .is_some_and(|last| now.saturating_duration_since(*last) < self.interval);
        if within_window {
            return false;
        }

        if last_accepted.len() >= PRUNE_THRESHOLD {
            let interval = self.interval;
            last_accepted.retain(|_, last| now.saturating_duration_since(*last) < interval);
        }

        last_accepted.insert(client, now);
        true
    }

    /// Number of clients currently remembered
    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
