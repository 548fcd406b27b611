//! Sliding-window rate limiter for vendor providers.
//!
//! Each provider gets two exact sliding logs of call timestamps, one for
//! the trailing minute and one for the trailing hour. A call is admitted
//! only when both logs have room; a rejected call records nothing, so
//! being throttled never extends the throttle.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::models::ProviderId;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Per-provider request ceilings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitPolicy {
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            requests_per_hour: 1000,
        }
    }
}

/// Which ceiling rejected a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateWindow {
    Minute,
    Hour,
}

impl fmt::Display for RateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minute => write!(f, "minute"),
            Self::Hour => write!(f, "hour"),
        }
    }
}

/// Returned when a call would exceed a ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitRejection {
    pub window: RateWindow,
    /// Time until the oldest call in the full window ages out.
    pub retry_after: Duration,
}

/// Timestamps of admitted calls for a single provider.
#[derive(Debug, Default)]
struct SlidingLog {
    minute: VecDeque<Instant>,
    hour: VecDeque<Instant>,
}

impl SlidingLog {
    fn prune(&mut self, now: Instant) {
        prune_older_than(&mut self.minute, now, MINUTE);
        prune_older_than(&mut self.hour, now, HOUR);
    }

    fn try_admit(
        &mut self,
        policy: &RateLimitPolicy,
        now: Instant,
    ) -> Result<(), RateLimitRejection> {
        self.prune(now);

        if self.minute.len() >= policy.requests_per_minute as usize {
            return Err(RateLimitRejection {
                window: RateWindow::Minute,
                retry_after: retry_after(&self.minute, now, MINUTE),
            });
        }
        if self.hour.len() >= policy.requests_per_hour as usize {
            return Err(RateLimitRejection {
                window: RateWindow::Hour,
                retry_after: retry_after(&self.hour, now, HOUR),
            });
        }

        self.minute.push_back(now);
        self.hour.push_back(now);
        Ok(())
    }
}

fn prune_older_than(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = log.front() {
        if now.saturating_duration_since(oldest) >= window {
            log.pop_front();
        } else {
            break;
        }
    }
}

fn retry_after(log: &VecDeque<Instant>, now: Instant, window: Duration) -> Duration {
    log.front()
        .map(|&oldest| window.saturating_sub(now.saturating_duration_since(oldest)))
        .unwrap_or(Duration::ZERO)
}

/// Thread-safe limiter holding one sliding log per provider.
///
/// The policy is passed on every call rather than stored, so a policy
/// change takes effect immediately against the existing history.
pub struct RateLimiter {
    logs: Mutex<HashMap<String, SlidingLog>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the logs, recovering from poison.
    ///
    /// A poisoned log at worst admits or rejects one call incorrectly.
    fn lock_logs(&self) -> MutexGuard<'_, HashMap<String, SlidingLog>> {
        self.logs.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Admit one call for `provider` or report which window is full.
    pub fn try_acquire(
        &self,
        provider: &ProviderId,
        policy: &RateLimitPolicy,
    ) -> Result<(), RateLimitRejection> {
        self.try_acquire_at(provider, policy, Instant::now())
    }

    /// [`try_acquire`](Self::try_acquire) against an explicit clock reading.
    pub fn try_acquire_at(
        &self,
        provider: &ProviderId,
        policy: &RateLimitPolicy,
        now: Instant,
    ) -> Result<(), RateLimitRejection> {
        let mut logs = self.lock_logs();
        let log = logs.entry(provider.to_string()).or_default();
        let result = log.try_admit(policy, now);
        if let Err(rejection) = &result {
            debug!(
                "Rate limiter: '{}' over its per-{} ceiling, retry in {:?}",
                provider, rejection.window, rejection.retry_after
            );
        }
        result
    }

    /// Calls admitted in the trailing minute and hour.
    #[cfg(test)]
    pub fn usage(&self, provider: &ProviderId) -> (usize, usize) {
        let mut logs = self.lock_logs();
        match logs.get_mut(provider.as_ref()) {
            Some(log) => {
                log.prune(Instant::now());
                (log.minute.len(), log.hour.len())
            }
            None => (0, 0),
        }
    }

    /// Forget all history for a provider.
    #[cfg(test)]
    pub fn reset(&self, provider: &ProviderId) {
        self.lock_logs().remove(provider.as_ref());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
