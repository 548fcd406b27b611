use std::collections::HashMap;
use std::time::Duration;

use billpay_vendors::{VendorOperation, VendorPayload, VendorResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_VENDOR_TIMEOUT, STALE_IN_FLIGHT_AFTER};
use crate::errors::{Result, ValidationError};

/// Timeouts for vendor calls made through the execution wrapper.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub default_timeout: Duration,
    pub operation_timeouts: HashMap<VendorOperation, Duration>,
    /// An `InFlight` ledger entry untouched for this long is assumed to
    /// belong to a caller that died mid-dispatch.
    pub stale_in_flight_after: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_VENDOR_TIMEOUT,
            operation_timeouts: HashMap::new(),
            stale_in_flight_after: STALE_IN_FLIGHT_AFTER,
        }
    }
}

impl ExecutionConfig {
    pub fn timeout_for(&self, operation: VendorOperation) -> Duration {
        self.operation_timeouts
            .get(&operation)
            .copied()
            .unwrap_or(self.default_timeout)
    }

    /// Longest timeout any vendor call may run for.
    pub fn max_timeout(&self) -> Duration {
        self.operation_timeouts
            .values()
            .copied()
            .fold(self.default_timeout, Duration::max)
    }

    pub fn validate(&self) -> Result<()> {
        let zero = self.default_timeout.is_zero()
            || self.operation_timeouts.values().any(Duration::is_zero);
        if zero {
            return Err(ValidationError::invalid("vendor timeouts must be positive").into());
        }
        // A live dispatch must never look abandoned.
        let max_timeout = self.max_timeout();
        if self.stale_in_flight_after <= max_timeout {
            return Err(ValidationError::invalid(format!(
                "in-flight staleness ({}s) must exceed the longest vendor timeout ({}s)",
                self.stale_in_flight_after.as_secs(),
                max_timeout.as_secs()
            ))
            .into());
        }
        Ok(())
    }
}

/// Canonical form of a purchase request, stored with its idempotency key so
/// a reused key can be matched against the request that first claimed it.
///
/// The provider is left out: a retry may be routed elsewhere and is still
/// the same purchase.
pub fn request_fingerprint(operation: VendorOperation, payload: &VendorPayload) -> String {
    let field = |value: Option<&str>| value.map(str::trim).unwrap_or_default().to_string();
    let mut parts = vec![
        operation.as_str().to_string(),
        field(payload.service_key.as_deref()).to_lowercase(),
        field(payload.recipient.as_deref()),
        payload
            .amount
            .map(|a| a.normalize().to_string())
            .unwrap_or_default(),
        field(payload.variation_code.as_deref()),
        field(payload.phone.as_deref()),
    ];
    parts.extend(payload.extra.iter().map(|(k, v)| format!("{}={}", k, v)));
    parts.join("|")
}

/// Lifecycle of an idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerState {
    /// Dispatched; no answer yet.
    InFlight,
    /// The vendor may have applied the purchase. Resolve by requery.
    Unknown,
    /// Final vendor answer stored.
    Completed,
}

impl LedgerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerState::InFlight => "IN_FLIGHT",
            LedgerState::Unknown => "UNKNOWN",
            LedgerState::Completed => "COMPLETED",
        }
    }
}

impl std::str::FromStr for LedgerState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "IN_FLIGHT" => Ok(LedgerState::InFlight),
            "UNKNOWN" => Ok(LedgerState::Unknown),
            "COMPLETED" => Ok(LedgerState::Completed),
            other => Err(format!("Unknown ledger state: {}", other)),
        }
    }
}

/// One purchase attempt, keyed by the caller's idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub key: String,
    /// Provider the purchase was first dispatched to.
    pub provider_id: String,
    pub operation: VendorOperation,
    /// See [`request_fingerprint`].
    pub fingerprint: String,
    pub state: LedgerState,
    pub result: Option<VendorResult>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BeginOutcome {
    /// The key was new and is now `InFlight` for this caller.
    Started,
    /// The key already exists.
    Existing(LedgerEntry),
}

/// How an execution obtained its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionSource {
    /// A fresh vendor call.
    Dispatched,
    /// A status query for an earlier dispatch with an unknown outcome.
    Requeried,
    /// The stored result of a completed purchase; no vendor call.
    Replayed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// Provider that produced the result. For requeries and replays this is
    /// the provider of the original dispatch.
    pub provider_id: String,
    pub result: VendorResult,
    pub source: ExecutionSource,
}
