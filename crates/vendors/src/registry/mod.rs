//! In-memory per-provider runtime state.
//!
//! This module provides the two pieces of mutable state the execution
//! layer keeps for every provider:
//! - Sliding-window rate limiting (minute and hour ceilings)
//! - A rolling health window from which status is derived

mod health_window;
mod rate_limiter;

pub use health_window::{
    CallOutcome, HealthStatus, HealthThresholds, HealthWindow, DEFAULT_CONSECUTIVE_FAILURES,
    DEFAULT_DEGRADED_BELOW_RATE, DEFAULT_DOWN_BELOW_RATE, DEFAULT_LATENCY_THRESHOLD_MS,
    DEFAULT_WINDOW_SIZE,
};
pub use rate_limiter::{RateLimitPolicy, RateLimitRejection, RateLimiter, RateWindow};
