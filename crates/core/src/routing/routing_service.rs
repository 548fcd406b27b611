use std::sync::Arc;

use billpay_vendors::ServiceCategory;
use log::{debug, warn};

use super::routing_model::{select_provider, RoutingDecision, RoutingReason};
use crate::errors::{Error, Result};
use crate::providers::ProviderRepositoryTrait;

/// Chooses the provider for each request from current registry state.
pub struct RoutingService {
    repository: Arc<dyn ProviderRepositoryTrait>,
}

impl RoutingService {
    pub fn new(repository: Arc<dyn ProviderRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Route a request for `category`, or fail with `NoProviderAvailable`.
    pub fn route(&self, category: ServiceCategory) -> Result<RoutingDecision> {
        let providers = self.repository.list()?;
        let Some((provider, reason)) = select_provider(&providers, category) else {
            warn!("No usable provider for {}", category);
            return Err(Error::NoProviderAvailable { category });
        };

        if reason == RoutingReason::Active {
            debug!("Routing {} to active provider '{}'", category, provider.name);
        } else {
            warn!(
                "Routing {} to '{}' ({}): active provider unavailable",
                category, provider.name, reason
            );
        }
        Ok(RoutingDecision {
            provider: provider.clone(),
            category,
            reason,
        })
    }
}
