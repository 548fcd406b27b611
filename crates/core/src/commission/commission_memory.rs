//! In-memory commission repository.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use billpay_vendors::ServiceCategory;
use log::warn;

use super::commission_model::CommissionConfig;
use super::commission_traits::CommissionRepositoryTrait;
use crate::errors::Result;

type TierKey = (ServiceCategory, Option<String>);

#[derive(Default)]
pub struct InMemoryCommissionRepository {
    tiers: RwLock<BTreeMap<TierKey, CommissionConfig>>,
}

impl InMemoryCommissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<TierKey, CommissionConfig>> {
        self.tiers.read().unwrap_or_else(|poisoned| {
            warn!("Commission lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<TierKey, CommissionConfig>> {
        self.tiers.write().unwrap_or_else(|poisoned| {
            warn!("Commission lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl CommissionRepositoryTrait for InMemoryCommissionRepository {
    fn get(&self, service: ServiceCategory, key: Option<&str>) -> Result<Option<CommissionConfig>> {
        Ok(self
            .read()
            .get(&(service, key.map(str::to_string)))
            .cloned())
    }

    fn list(&self) -> Result<Vec<CommissionConfig>> {
        Ok(self.read().values().cloned().collect())
    }

    async fn upsert(&self, config: CommissionConfig) -> Result<CommissionConfig> {
        self.write()
            .insert((config.service, config.key.clone()), config.clone());
        Ok(config)
    }

    async fn delete(&self, service: ServiceCategory, key: Option<&str>) -> Result<bool> {
        Ok(self
            .write()
            .remove(&(service, key.map(str::to_string)))
            .is_some())
    }
}
