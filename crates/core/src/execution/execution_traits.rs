use async_trait::async_trait;
use billpay_vendors::{VendorOperation, VendorResult};

use super::execution_model::{BeginOutcome, LedgerEntry};
use crate::errors::Result;

/// Record of purchase attempts keyed by idempotency key.
///
/// `try_begin` must be atomic: of any number of concurrent callers with the
/// same key, exactly one sees [`BeginOutcome::Started`].
#[async_trait]
pub trait IdempotencyLedgerTrait: Send + Sync {
    async fn try_begin(
        &self,
        key: &str,
        provider_id: &str,
        operation: VendorOperation,
        fingerprint: &str,
    ) -> Result<BeginOutcome>;
    async fn mark_unknown(&self, key: &str) -> Result<()>;
    async fn complete(&self, key: &str, result: &VendorResult) -> Result<()>;
    /// Forget the key so a later call may dispatch under it again.
    async fn release(&self, key: &str) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<LedgerEntry>>;
}
