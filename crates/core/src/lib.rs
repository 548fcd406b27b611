//! Billpay Core - upstream provider management for a bill-payment platform.
//!
//! This crate holds the database-agnostic domain: the provider registry,
//! health monitoring, routing and failover, commission pricing, and the
//! execution wrapper that rate-limits every vendor call and makes purchases
//! idempotent. Repository traits defined here are implemented by the
//! `storage-sqlite` crate; in-memory implementations ship alongside them.

pub mod checkout;
pub mod commission;
pub mod constants;
pub mod errors;
pub mod execution;
pub mod health;
pub mod providers;
pub mod routing;

#[cfg(test)]
mod testing;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
