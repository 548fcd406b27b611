//! SQLite storage implementation for commission tiers.

mod model;
mod repository;

pub use model::CommissionConfigDB;
pub use repository::CommissionRepository;
