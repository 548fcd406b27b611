use std::sync::Arc;

use async_trait::async_trait;
use billpay_core::commission::{CommissionConfig, CommissionRepositoryTrait};
use billpay_core::errors::{Error, Result};
use billpay_vendors::ServiceCategory;
use diesel::prelude::*;

use super::model::{storage_key, CommissionConfigDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::commission_configs;

pub struct CommissionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CommissionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        CommissionRepository { pool, writer }
    }
}

#[async_trait]
impl CommissionRepositoryTrait for CommissionRepository {
    fn get(&self, service: ServiceCategory, key: Option<&str>) -> Result<Option<CommissionConfig>> {
        let mut conn = get_connection(&self.pool)?;
        let row = commission_configs::table
            .find((service.as_str(), storage_key(key)))
            .select(CommissionConfigDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(|r| CommissionConfig::try_from(r).map_err(Error::from))
            .transpose()
    }

    fn list(&self) -> Result<Vec<CommissionConfig>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = commission_configs::table
            .order((commission_configs::service.asc(), commission_configs::config_key.asc()))
            .select(CommissionConfigDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|r| CommissionConfig::try_from(r).map_err(Error::from))
            .collect()
    }

    async fn upsert(&self, config: CommissionConfig) -> Result<CommissionConfig> {
        let row = CommissionConfigDB::from(&config);
        self.writer
            .exec(move |conn| {
                diesel::replace_into(commission_configs::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;
        Ok(config)
    }

    async fn delete(&self, service: ServiceCategory, key: Option<&str>) -> Result<bool> {
        let config_key = storage_key(key);
        self.writer
            .exec(move |conn| {
                let deleted = diesel::delete(
                    commission_configs::table.find((service.as_str(), config_key.as_str())),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(deleted > 0)
            })
            .await
    }
}
