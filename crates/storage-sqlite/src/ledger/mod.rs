//! SQLite-backed idempotency ledger for purchase dispatches.

mod model;
mod repository;

pub use model::VendorRequestDB;
pub use repository::SqliteIdempotencyLedger;
