//! Billpay Vendors Crate
//!
//! This crate provides the vendor-facing half of the bill-payment platform:
//! the uniform operation surface, the adapters that translate it into each
//! vendor's HTTP contract, and the per-provider runtime state (rate limits
//! and rolling health) the execution layer consults.
//!
//! # Overview
//!
//! - Uniform operations: wallet balance, four purchase kinds, requery, plan listing
//! - Bundled adapters: VTPass, Clubkonnect, and a generic JSON "custom" vendor
//! - Failure classification that separates unknown outcomes from rejections
//! - Sliding-window rate limiting and ring-buffer health windows
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  VendorPayload   | --> |  VendorContext   |  (provider snapshot)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |  VendorAdapter   |  (VTPass, Clubkonnect, Custom)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |  VendorResult    |  or VendorError
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`VendorOperation`] - Logical operation with an endpoint per provider
//! - [`VendorPayload`] / [`VendorResult`] - Uniform request and response
//! - [`VendorAdapter`] - Capability every vendor integration implements
//! - [`VendorKind`] - Tagged vendor variant chosen from the provider name
//! - [`VendorError`] / [`FailureClass`] - Errors and their outcome class

pub mod adapter;
pub mod errors;
pub mod models;
pub mod registry;

pub use models::{
    ProviderId, ServiceCategory, TransactionStatus, VendorCredentials,
    VendorOperation, VendorPayload, VendorResult,
};

pub use adapter::{required_operations, VendorAdapter, VendorAdapters, VendorContext, VendorKind};
pub use errors::{FailureClass, VendorError};

pub use registry::{
    CallOutcome, HealthStatus, HealthThresholds, HealthWindow, RateLimitPolicy,
    RateLimitRejection, RateLimiter, RateWindow,
};
