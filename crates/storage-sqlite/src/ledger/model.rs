use std::str::FromStr;

use billpay_core::execution::{LedgerEntry, LedgerState};
use billpay_vendors::{VendorOperation, VendorResult};
use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;

#[derive(Queryable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::vendor_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VendorRequestDB {
    pub idempotency_key: String,
    pub provider_id: String,
    pub operation: String,
    pub fingerprint: String,
    pub state: String,
    /// JSON-encoded `VendorResult`.
    pub result: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl VendorRequestDB {
    pub fn in_flight(
        key: &str,
        provider_id: &str,
        operation: VendorOperation,
        fingerprint: &str,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            idempotency_key: key.to_string(),
            provider_id: provider_id.to_string(),
            operation: operation.as_str().to_string(),
            fingerprint: fingerprint.to_string(),
            state: LedgerState::InFlight.as_str().to_string(),
            result: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<VendorRequestDB> for LedgerEntry {
    type Error = StorageError;

    fn try_from(row: VendorRequestDB) -> Result<Self, Self::Error> {
        let operation =
            VendorOperation::from_str(&row.operation).map_err(StorageError::SerializationError)?;
        let state = LedgerState::from_str(&row.state).map_err(StorageError::SerializationError)?;
        let result = row
            .result
            .as_deref()
            .map(serde_json::from_str::<VendorResult>)
            .transpose()?;
        Ok(LedgerEntry {
            key: row.idempotency_key,
            provider_id: row.provider_id,
            operation,
            fingerprint: row.fingerprint,
            state,
            result,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
