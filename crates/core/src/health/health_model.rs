//! Health domain models.

use std::time::Duration;

use billpay_vendors::{HealthStatus, HealthThresholds, HealthWindow};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PROBE_TIMEOUT;
use crate::errors::{Result, ValidationError};

/// Thresholds and timeouts for health tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthConfig {
    /// Number of recent outcomes kept per provider.
    pub window_size: usize,
    pub consecutive_failures_for_down: usize,
    /// Percent. Below this the provider is down.
    pub down_success_rate: f64,
    /// Percent. Below this the provider is degraded.
    pub degraded_success_rate: f64,
    pub latency_threshold_ms: u64,
    pub probe_timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        let thresholds = HealthThresholds::default();
        Self {
            window_size: thresholds.window_size,
            consecutive_failures_for_down: thresholds.consecutive_failures,
            down_success_rate: thresholds.down_below_rate,
            degraded_success_rate: thresholds.degraded_below_rate,
            latency_threshold_ms: thresholds.latency_threshold_ms,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl HealthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(ValidationError::invalid("health window size must be positive").into());
        }
        if self.consecutive_failures_for_down == 0 {
            return Err(
                ValidationError::invalid("consecutive failure threshold must be positive").into(),
            );
        }
        let rate_ok = |r: f64| (0.0..=100.0).contains(&r);
        if !rate_ok(self.down_success_rate) || !rate_ok(self.degraded_success_rate) {
            return Err(ValidationError::invalid("success-rate thresholds must be 0..=100").into());
        }
        if self.down_success_rate > self.degraded_success_rate {
            return Err(ValidationError::invalid(
                "down threshold must not exceed degraded threshold",
            )
            .into());
        }
        if self.probe_timeout.is_zero() {
            return Err(ValidationError::invalid("probe timeout must be positive").into());
        }
        Ok(())
    }

    pub fn thresholds(&self) -> HealthThresholds {
        HealthThresholds {
            window_size: self.window_size,
            consecutive_failures: self.consecutive_failures_for_down,
            down_below_rate: self.down_success_rate,
            degraded_below_rate: self.degraded_success_rate,
            latency_threshold_ms: self.latency_threshold_ms,
        }
    }
}

/// Persisted health state of a provider, as shown in the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    /// Rolling average latency over the window.
    pub response_time_ms: Option<u64>,
    pub last_response_time_ms: Option<u64>,
    /// Rolling success rate over the window, percent.
    pub success_rate: f64,
    /// Lifetime count of recorded outcomes.
    pub total_requests: u64,
    pub consecutive_failures: u32,
    pub last_checked_at: Option<NaiveDateTime>,
}

impl Default for HealthSnapshot {
    fn default() -> Self {
        Self {
            status: HealthStatus::Healthy,
            response_time_ms: None,
            last_response_time_ms: None,
            success_rate: 100.0,
            total_requests: 0,
            consecutive_failures: 0,
            last_checked_at: None,
        }
    }
}

impl HealthSnapshot {
    /// Derive a snapshot from a window plus the lifetime counter.
    pub fn from_window(
        window: &HealthWindow,
        thresholds: &HealthThresholds,
        total_requests: u64,
        checked_at: NaiveDateTime,
    ) -> Self {
        Self {
            status: window.status(thresholds),
            response_time_ms: window.average_latency_ms(),
            last_response_time_ms: window.last().map(|o| o.latency_ms),
            success_rate: window.success_rate().unwrap_or(100.0),
            total_requests,
            consecutive_failures: window.consecutive_failures() as u32,
            last_checked_at: Some(checked_at),
        }
    }
}

/// Outcome of one connectivity test. Never an error: failures are data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthProbeResult {
    pub provider_id: String,
    pub success: bool,
    pub latency_ms: u64,
    pub balance: Option<Decimal>,
    pub message: Option<String>,
    /// Status after the outcome was folded in; `None` when the probe was
    /// not recorded (local rejection or unknown provider).
    pub status: Option<HealthStatus>,
    pub checked_at: NaiveDateTime,
}
