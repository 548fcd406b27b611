//! Execution wrapper - rate limiting, timeouts, health feedback and
//! idempotent purchases around every vendor call.

mod execution_model;
mod execution_service;
mod execution_traits;
mod ledger_memory;

pub use execution_model::{
    request_fingerprint, BeginOutcome, Execution, ExecutionConfig, ExecutionSource, LedgerEntry,
    LedgerState,
};
pub use execution_service::ExecutionService;
pub use execution_traits::IdempotencyLedgerTrait;
pub use ledger_memory::InMemoryIdempotencyLedger;
