//! In-memory idempotency ledger.

use async_trait::async_trait;
use billpay_vendors::{VendorOperation, VendorResult};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::execution_model::{BeginOutcome, LedgerEntry, LedgerState};
use super::execution_traits::IdempotencyLedgerTrait;
use crate::errors::Result;

#[derive(Default)]
pub struct InMemoryIdempotencyLedger {
    entries: DashMap<String, LedgerEntry>,
}

impl InMemoryIdempotencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn transition(&self, key: &str, state: LedgerState, result: Option<&VendorResult>) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.state = state;
            if let Some(result) = result {
                entry.result = Some(result.clone());
            }
            entry.updated_at = Utc::now().naive_utc();
        }
    }
}

#[async_trait]
impl IdempotencyLedgerTrait for InMemoryIdempotencyLedger {
    async fn try_begin(
        &self,
        key: &str,
        provider_id: &str,
        operation: VendorOperation,
        fingerprint: &str,
    ) -> Result<BeginOutcome> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(existing) => Ok(BeginOutcome::Existing(existing.get().clone())),
            Entry::Vacant(slot) => {
                let now = Utc::now().naive_utc();
                slot.insert(LedgerEntry {
                    key: key.to_string(),
                    provider_id: provider_id.to_string(),
                    operation,
                    fingerprint: fingerprint.to_string(),
                    state: LedgerState::InFlight,
                    result: None,
                    created_at: now,
                    updated_at: now,
                });
                Ok(BeginOutcome::Started)
            }
        }
    }

    async fn mark_unknown(&self, key: &str) -> Result<()> {
        self.transition(key, LedgerState::Unknown, None);
        Ok(())
    }

    async fn complete(&self, key: &str, result: &VendorResult) -> Result<()> {
        self.transition(key, LedgerState::Completed, Some(result));
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<LedgerEntry>> {
        Ok(self.entries.get(key).map(|e| e.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billpay_vendors::TransactionStatus;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_only_one_concurrent_begin_starts() {
        let ledger = Arc::new(InMemoryIdempotencyLedger::new());
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger
                        .try_begin("order-1", "p1", VendorOperation::DataPurchase, "fp")
                        .await
                        .unwrap()
                })
            })
            .collect();
        let mut started = 0;
        for task in tasks {
            if task.await.unwrap() == BeginOutcome::Started {
                started += 1;
            }
        }
        assert_eq!(started, 1);
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let ledger = InMemoryIdempotencyLedger::new();
        ledger
            .try_begin("k", "p1", VendorOperation::AirtimePurchase, "fp")
            .await
            .unwrap();
        ledger.mark_unknown("k").await.unwrap();
        assert_eq!(ledger.get("k").unwrap().unwrap().state, LedgerState::Unknown);

        let result = VendorResult::new(VendorOperation::QueryTransaction, TransactionStatus::Delivered);
        ledger.complete("k", &result).await.unwrap();
        let entry = ledger.get("k").unwrap().unwrap();
        assert_eq!(entry.state, LedgerState::Completed);
        assert_eq!(entry.result, Some(result));
        assert_eq!(entry.provider_id, "p1");

        ledger.release("k").await.unwrap();
        assert!(ledger.get("k").unwrap().is_none());
    }
}
