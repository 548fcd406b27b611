//! SQLite storage implementation for the billpay provider layer.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `billpay-core` and contains:
//! - Database connection pooling and the single-writer actor
//! - Diesel migrations
//! - Repositories for providers, commission tiers and the idempotency ledger
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! `billpay-core` is database-agnostic and works with traits.
//!
//! ```text
//! vendors (adapters)
//!       │
//!       ▼
//! core (domain) ───────► storage-sqlite (this crate)
//!                                │
//!                                ▼
//!                            SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod commission;
pub mod ledger;
pub mod providers;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, open, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use commission::CommissionRepository;
pub use ledger::SqliteIdempotencyLedger;
pub use providers::ProviderRepository;

// Re-export from billpay-core for convenience
pub use billpay_core::errors::{DatabaseError, Error, Result};
