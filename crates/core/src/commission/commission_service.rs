use std::sync::Arc;

use async_trait::async_trait;
use billpay_vendors::ServiceCategory;
use chrono::Utc;
use log::{debug, info};
use rust_decimal::Decimal;

use super::commission_model::{
    compute_price, normalize_key, pass_through, CommissionConfig, CommissionRateInput,
    CommissionTier, PriceQuote,
};
use super::commission_traits::{CommissionRepositoryTrait, CommissionServiceTrait};
use crate::errors::{Error, Result};

/// Service for commission tiers and pricing.
pub struct CommissionService {
    repository: Arc<dyn CommissionRepositoryTrait>,
}

impl CommissionService {
    pub fn new(repository: Arc<dyn CommissionRepositoryTrait>) -> Self {
        Self { repository }
    }

    async fn save(
        &self,
        service: ServiceCategory,
        key: Option<String>,
        input: CommissionRateInput,
    ) -> Result<CommissionConfig> {
        input.validate(service)?;
        let config = CommissionConfig {
            service,
            key,
            commission_rate: input.commission_rate,
            min_amount: input.min_amount,
            max_amount: input.max_amount,
            updated_at: Utc::now().naive_utc(),
        };
        self.repository.upsert(config).await
    }
}

#[async_trait]
impl CommissionServiceTrait for CommissionService {
    fn price(
        &self,
        service: ServiceCategory,
        key: Option<&str>,
        amount: Decimal,
    ) -> Result<PriceQuote> {
        let key = key
            .filter(|k| !k.trim().is_empty())
            .map(|k| normalize_key(service, k))
            .transpose()?;

        if service == ServiceCategory::Cable {
            return pass_through(service, key, amount);
        }

        if let Some(k) = key.as_deref() {
            if let Some(config) = self.repository.get(service, Some(k))? {
                debug!("Pricing {} {} with override rate {}%", service, k, config.commission_rate);
                return compute_price(&config, amount, CommissionTier::Override);
            }
        }

        let global = self
            .repository
            .get(service, None)?
            .ok_or(Error::CommissionNotConfigured(service))?;
        let mut quote = compute_price(&global, amount, CommissionTier::Global)?;
        quote.key = key;
        Ok(quote)
    }

    fn list_configs(&self) -> Result<Vec<CommissionConfig>> {
        self.repository.list()
    }

    async fn set_global(
        &self,
        service: ServiceCategory,
        input: CommissionRateInput,
    ) -> Result<CommissionConfig> {
        let saved = self.save(service, None, input).await?;
        info!("Set global {} commission to {}%", service, saved.commission_rate);
        Ok(saved)
    }

    async fn set_override(
        &self,
        service: ServiceCategory,
        key: &str,
        input: CommissionRateInput,
    ) -> Result<CommissionConfig> {
        let key = normalize_key(service, key)?;
        let saved = self.save(service, Some(key), input).await?;
        info!(
            "Set {} commission override for '{}' to {}%",
            service,
            saved.key.as_deref().unwrap_or_default(),
            saved.commission_rate
        );
        Ok(saved)
    }

    async fn remove_override(&self, service: ServiceCategory, key: &str) -> Result<()> {
        let key = normalize_key(service, key)?;
        if !self.repository.delete(service, Some(&key)).await? {
            return Err(Error::not_found(format!(
                "{} commission override for '{}'",
                service, key
            )));
        }
        info!("Removed {} commission override for '{}'", service, key);
        Ok(())
    }
}
