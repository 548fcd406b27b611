use std::sync::Arc;

use async_trait::async_trait;
use billpay_core::errors::{Error, Result};
use billpay_core::execution::{BeginOutcome, IdempotencyLedgerTrait, LedgerEntry, LedgerState};
use billpay_vendors::{VendorOperation, VendorResult};
use chrono::Utc;
use diesel::prelude::*;
use log::warn;

use super::model::VendorRequestDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::vendor_requests;

/// Idempotency ledger persisted in `vendor_requests`, so an unknown
/// outcome survives a restart and is still requeried rather than resent.
pub struct SqliteIdempotencyLedger {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteIdempotencyLedger {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SqliteIdempotencyLedger { pool, writer }
    }

    async fn transition(
        &self,
        key: &str,
        state: LedgerState,
        result: Option<String>,
    ) -> Result<()> {
        let target_key = key.to_string();
        let updated = self
            .writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();
                let target = vendor_requests::table.find(target_key.as_str());
                let updated = match result {
                    Some(result) => diesel::update(target)
                        .set((
                            vendor_requests::state.eq(state.as_str()),
                            vendor_requests::result.eq(Some(result)),
                            vendor_requests::updated_at.eq(now),
                        ))
                        .execute(conn),
                    None => diesel::update(target)
                        .set((
                            vendor_requests::state.eq(state.as_str()),
                            vendor_requests::updated_at.eq(now),
                        ))
                        .execute(conn),
                }
                .map_err(StorageError::from)?;
                Ok(updated)
            })
            .await?;
        if updated == 0 {
            warn!("Ledger key {} not found while moving to {}", key, state.as_str());
        }
        Ok(())
    }
}

#[async_trait]
impl IdempotencyLedgerTrait for SqliteIdempotencyLedger {
    async fn try_begin(
        &self,
        key: &str,
        provider_id: &str,
        operation: VendorOperation,
        fingerprint: &str,
    ) -> Result<BeginOutcome> {
        let row = VendorRequestDB::in_flight(
            key,
            provider_id,
            operation,
            fingerprint,
            Utc::now().naive_utc(),
        );
        self.writer
            .exec(move |conn| {
                let existing = vendor_requests::table
                    .find(row.idempotency_key.as_str())
                    .select(VendorRequestDB::as_select())
                    .first(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                if let Some(existing) = existing {
                    return Ok(BeginOutcome::Existing(LedgerEntry::try_from(existing)?));
                }
                diesel::insert_into(vendor_requests::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(BeginOutcome::Started)
            })
            .await
    }

    async fn mark_unknown(&self, key: &str) -> Result<()> {
        self.transition(key, LedgerState::Unknown, None).await
    }

    async fn complete(&self, key: &str, result: &VendorResult) -> Result<()> {
        let encoded = serde_json::to_string(result).map_err(StorageError::from)?;
        self.transition(key, LedgerState::Completed, Some(encoded))
            .await
    }

    async fn release(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(vendor_requests::table.find(key.as_str()))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn get(&self, key: &str) -> Result<Option<LedgerEntry>> {
        let mut conn = get_connection(&self.pool)?;
        vendor_requests::table
            .find(key)
            .select(VendorRequestDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(|row| LedgerEntry::try_from(row).map_err(Error::from))
            .transpose()
    }
}
