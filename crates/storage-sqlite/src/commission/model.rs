use std::str::FromStr;

use billpay_core::commission::CommissionConfig;
use billpay_vendors::ServiceCategory;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::errors::StorageError;

/// The global tier is stored under the empty key.
pub(crate) const GLOBAL_KEY: &str = "";

pub(crate) fn storage_key(key: Option<&str>) -> String {
    key.unwrap_or(GLOBAL_KEY).to_string()
}

/// Database model for commission tiers. Decimals are stored as text so no
/// precision is lost.
#[derive(Queryable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::commission_configs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommissionConfigDB {
    pub service: String,
    pub config_key: String,
    pub commission_rate: String,
    pub min_amount: String,
    pub max_amount: String,
    pub updated_at: NaiveDateTime,
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value).map_err(|e| {
        StorageError::SerializationError(format!("invalid {} '{}': {}", column, value, e))
    })
}

impl From<&CommissionConfig> for CommissionConfigDB {
    fn from(config: &CommissionConfig) -> Self {
        Self {
            service: config.service.as_str().to_string(),
            config_key: storage_key(config.key.as_deref()),
            commission_rate: config.commission_rate.to_string(),
            min_amount: config.min_amount.to_string(),
            max_amount: config.max_amount.to_string(),
            updated_at: config.updated_at,
        }
    }
}

impl TryFrom<CommissionConfigDB> for CommissionConfig {
    type Error = StorageError;

    fn try_from(row: CommissionConfigDB) -> Result<Self, Self::Error> {
        let service =
            ServiceCategory::from_str(&row.service).map_err(StorageError::SerializationError)?;
        Ok(CommissionConfig {
            service,
            key: Some(row.config_key).filter(|k| k != GLOBAL_KEY),
            commission_rate: parse_decimal("commission_rate", &row.commission_rate)?,
            min_amount: parse_decimal("min_amount", &row.min_amount)?,
            max_amount: parse_decimal("max_amount", &row.max_amount)?,
            updated_at: row.updated_at,
        })
    }
}
