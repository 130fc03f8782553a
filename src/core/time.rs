use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

pub const FIXED_TIME_ENV: &str = "LURE_SCAN_FIXED_TIME";

pub fn now_utc() -> DateTime<Utc> {
    if let Ok(value) = std::env::var(FIXED_TIME_ENV) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return dt.with_timezone(&Utc);
        }
    }
    Utc::now()
}

/// Wall-clock budget for one analysis, measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }

    /// The smaller of `limit` and what is left of the budget.
    pub fn clamp(&self, limit: Duration) -> Duration {
        limit.min(self.remaining())
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
