use async_trait::async_trait;
use billpay_vendors::ServiceCategory;
use rust_decimal::Decimal;

use super::commission_model::{CommissionConfig, CommissionRateInput, PriceQuote};
use crate::errors::Result;

/// Storage for commission tiers. `key == None` addresses the global tier.
#[async_trait]
pub trait CommissionRepositoryTrait: Send + Sync {
    fn get(&self, service: ServiceCategory, key: Option<&str>) -> Result<Option<CommissionConfig>>;
    fn list(&self) -> Result<Vec<CommissionConfig>>;
    /// Insert or replace the tier addressed by `(service, key)`.
    async fn upsert(&self, config: CommissionConfig) -> Result<CommissionConfig>;
    /// Returns whether a tier was deleted.
    async fn delete(&self, service: ServiceCategory, key: Option<&str>) -> Result<bool>;
}

#[async_trait]
pub trait CommissionServiceTrait: Send + Sync {
    /// Price `amount` for `service`, using the override for `key` when one
    /// exists and the global tier otherwise.
    fn price(&self, service: ServiceCategory, key: Option<&str>, amount: Decimal)
        -> Result<PriceQuote>;
    fn list_configs(&self) -> Result<Vec<CommissionConfig>>;
    async fn set_global(
        &self,
        service: ServiceCategory,
        input: CommissionRateInput,
    ) -> Result<CommissionConfig>;
    async fn set_override(
        &self,
        service: ServiceCategory,
        key: &str,
        input: CommissionRateInput,
    ) -> Result<CommissionConfig>;
    async fn remove_override(&self, service: ServiceCategory, key: &str) -> Result<()>;
}
