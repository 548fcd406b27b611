//! Rolling health window for a single provider.
//!
//! Outcomes of real calls and probes are pushed into a fixed-capacity ring
//! buffer. Success rate, latency and status are derived from the buffer
//! contents on demand, so they can never drift from each other.
//!
//! Status rules, evaluated in order:
//!
//! - **Down**: the most recent `consecutive_failures` outcomes all failed,
//!   or the success rate is below `down_below_rate`.
//! - **Degraded**: the success rate is below `degraded_below_rate`, or the
//!   average latency exceeds `latency_threshold_ms`.
//! - **Healthy**: otherwise, including an empty window.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_SIZE: usize = 100;
pub const DEFAULT_CONSECUTIVE_FAILURES: usize = 3;
pub const DEFAULT_DOWN_BELOW_RATE: f64 = 50.0;
pub const DEFAULT_DEGRADED_BELOW_RATE: f64 = 90.0;
pub const DEFAULT_LATENCY_THRESHOLD_MS: u64 = 5000;

/// Derived health status of a provider.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Down => "down",
        }
    }

    /// Ordering used by failover: lower is better.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Degraded => 1,
            Self::Down => 2,
        }
    }

    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Down)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthy" => Ok(Self::Healthy),
            "degraded" => Ok(Self::Degraded),
            "down" => Ok(Self::Down),
            other => Err(format!("unknown health status '{}'", other)),
        }
    }
}

/// Thresholds for status derivation.
#[derive(Clone, Debug, PartialEq)]
pub struct HealthThresholds {
    pub window_size: usize,
    pub consecutive_failures: usize,
    /// Percent.
    pub down_below_rate: f64,
    /// Percent.
    pub degraded_below_rate: f64,
    pub latency_threshold_ms: u64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            consecutive_failures: DEFAULT_CONSECUTIVE_FAILURES,
            down_below_rate: DEFAULT_DOWN_BELOW_RATE,
            degraded_below_rate: DEFAULT_DEGRADED_BELOW_RATE,
            latency_threshold_ms: DEFAULT_LATENCY_THRESHOLD_MS,
        }
    }
}

/// One observed call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallOutcome {
    pub success: bool,
    pub latency_ms: u64,
}

impl CallOutcome {
    pub fn success(latency_ms: u64) -> Self {
        Self {
            success: true,
            latency_ms,
        }
    }

    pub fn failure(latency_ms: u64) -> Self {
        Self {
            success: false,
            latency_ms,
        }
    }
}

/// Fixed-capacity ring buffer of recent outcomes.
#[derive(Clone, Debug)]
pub struct HealthWindow {
    slots: Vec<CallOutcome>,
    /// Index the next outcome is written to.
    head: usize,
    len: usize,
    capacity: usize,
}

impl HealthWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            len: 0,
            capacity,
        }
    }

    pub fn push(&mut self, outcome: CallOutcome) {
        if self.slots.len() < self.capacity {
            self.slots.push(outcome);
        } else {
            self.slots[self.head] = outcome;
        }
        self.head = (self.head + 1) % self.capacity;
        self.len = (self.len + 1).min(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Outcomes from most recent to oldest.
    pub fn recent(&self) -> impl Iterator<Item = &CallOutcome> + '_ {
        (1..=self.len).map(move |back| {
            let idx = (self.head + self.capacity - back) % self.capacity;
            &self.slots[idx]
        })
    }

    pub fn last(&self) -> Option<&CallOutcome> {
        self.recent().next()
    }

    /// Percentage of successful outcomes, or `None` when empty.
    pub fn success_rate(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let successes = self.recent().filter(|o| o.success).count();
        Some(successes as f64 * 100.0 / self.len as f64)
    }

    pub fn average_latency_ms(&self) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        let total: u64 = self.recent().map(|o| o.latency_ms).sum();
        Some(total / self.len as u64)
    }

    /// Length of the current run of failures, most recent first.
    pub fn consecutive_failures(&self) -> usize {
        self.recent().take_while(|o| !o.success).count()
    }

    pub fn status(&self, thresholds: &HealthThresholds) -> HealthStatus {
        let Some(rate) = self.success_rate() else {
            return HealthStatus::Healthy;
        };

        let failure_run = thresholds.consecutive_failures.max(1);
        if self.consecutive_failures() >= failure_run || rate < thresholds.down_below_rate {
            return HealthStatus::Down;
        }

        let slow = self
            .average_latency_ms()
            .is_some_and(|ms| ms > thresholds.latency_threshold_ms);
        if rate < thresholds.degraded_below_rate || slow {
            return HealthStatus::Degraded;
        }

        HealthStatus::Healthy
    }
}

impl Default for HealthWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}
