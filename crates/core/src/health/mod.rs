//! Provider health monitoring.
//!
//! Two sources feed each provider's rolling health window:
//!
//! - **Active probes** - a wallet-balance call triggered by an administrator
//!   or the probe scheduler, bounded by `HealthConfig::probe_timeout`
//! - **Passive observation** - the execution layer reports the outcome of
//!   every real vendor call
//!
//! The window lives in memory; the derived [`HealthSnapshot`] is written
//! back to the provider record after every outcome so routing and the admin
//! console read it from the registry.

mod health_model;
mod health_monitor;

pub use health_model::{HealthConfig, HealthProbeResult, HealthSnapshot};
pub use health_monitor::HealthMonitor;
