use std::time::Duration;

/// Timeout for a single health probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a vendor call when no per-operation override is set.
pub const DEFAULT_VENDOR_TIMEOUT: Duration = Duration::from_secs(30);

/// An in-flight ledger entry older than this is treated as abandoned.
pub const STALE_IN_FLIGHT_AFTER: Duration = Duration::from_secs(120);

/// Maximum commission rate (percent) for airtime and data.
pub const MAX_TELECOM_COMMISSION_RATE: u32 = 100;

/// Maximum commission rate (percent) for electricity.
pub const MAX_ELECTRICITY_COMMISSION_RATE: u32 = 50;

/// Mobile networks with a commission override tier.
pub const NETWORKS: &[&str] = &["mtn", "glo", "airtel", "9mobile"];

/// Electricity distribution companies with a commission override tier.
pub const DISCOS: &[&str] = &[
    "ikeja",
    "eko",
    "abuja",
    "kano",
    "portharcourt",
    "jos",
    "ibadan",
    "kaduna",
    "enugu",
    "benin",
    "yola",
];
