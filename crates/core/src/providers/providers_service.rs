use std::sync::Arc;

use async_trait::async_trait;
use billpay_vendors::{RateLimitPolicy, VendorKind};
use chrono::Utc;
use log::{debug, info};
use uuid::Uuid;

use super::providers_model::{
    dedupe_services, NewProvider, Provider, ProviderFilter, ProviderUpdate,
};
use super::providers_traits::{ProviderRepositoryTrait, ProviderServiceTrait};
use crate::errors::{Error, Result, ValidationError};
use crate::health::HealthSnapshot;

/// Service for the provider registry.
pub struct ProviderService {
    repository: Arc<dyn ProviderRepositoryTrait>,
}

impl ProviderService {
    pub fn new(repository: Arc<dyn ProviderRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Build a full provider record from registration input, applying the
    /// vendor template selected by the name.
    fn build_provider(new_provider: NewProvider) -> Result<Provider> {
        new_provider.validate()?;
        let name = new_provider.name.trim().to_string();
        let kind = VendorKind::from_name(&name);

        let base_url = match new_provider.base_url.filter(|u| !u.trim().is_empty()) {
            Some(url) => url.trim().to_string(),
            None => kind
                .default_base_url()
                .map(str::to_string)
                .ok_or_else(|| Error::from(ValidationError::MissingField("baseUrl".to_string())))?,
        };

        let mut endpoints = kind.default_endpoints();
        for (operation, path) in new_provider.endpoints {
            if !path.trim().is_empty() {
                endpoints.insert(operation, path.trim().to_string());
            }
        }

        let now = Utc::now().naive_utc();
        let provider = Provider {
            id: Uuid::new_v4().to_string(),
            name,
            display_name: new_provider.display_name.trim().to_string(),
            description: new_provider.description.filter(|d| !d.trim().is_empty()),
            vendor_kind: kind,
            credentials: new_provider.credentials,
            base_url,
            endpoints,
            supported_services: dedupe_services(&new_provider.supported_services),
            is_active: new_provider.is_active,
            is_default: new_provider.is_default,
            rate_limit: new_provider.rate_limit.unwrap_or_default(),
            health: HealthSnapshot::default(),
            removed_at: None,
            created_at: now,
            updated_at: now,
        };
        provider.validate()?;
        Ok(provider)
    }

    fn get_live(&self, provider_id: &str) -> Result<Provider> {
        let provider = self.repository.get_by_id(provider_id)?;
        if provider.is_removed() {
            return Err(Error::not_found(format!(
                "provider {} has been removed",
                provider_id
            )));
        }
        Ok(provider)
    }
}

#[async_trait]
impl ProviderServiceTrait for ProviderService {
    async fn register(&self, new_provider: NewProvider) -> Result<Provider> {
        let provider = Self::build_provider(new_provider)?;
        if self.repository.get_by_name(&provider.name)?.is_some() {
            return Err(Error::Conflict(format!(
                "provider name '{}' already exists",
                provider.name
            )));
        }
        let created = self.repository.create(provider).await?;
        info!(
            "Registered provider '{}' ({}) as {}",
            created.name, created.id, created.vendor_kind
        );
        Ok(created)
    }

    async fn update(&self, provider_id: &str, patch: ProviderUpdate) -> Result<Provider> {
        let existing = self.get_live(provider_id)?;
        let mut updated = patch.apply_to(&existing);
        updated.updated_at = Utc::now().naive_utc();
        updated.validate()?;
        let saved = self.repository.update(updated, patch.selection()).await?;
        debug!("Updated provider '{}'", saved.name);
        Ok(saved)
    }

    async fn set_active(&self, provider_id: &str) -> Result<Provider> {
        let provider = self.get_live(provider_id)?;
        self.repository
            .set_active(Some(provider.id.clone()))
            .await?;
        info!("Provider '{}' is now the active provider", provider.name);
        self.repository.get_by_id(provider_id)
    }

    async fn clear_active(&self) -> Result<()> {
        self.repository.set_active(None).await?;
        info!("Cleared active provider");
        Ok(())
    }

    async fn set_default(&self, provider_id: &str) -> Result<Provider> {
        let provider = self.get_live(provider_id)?;
        self.repository
            .set_default(Some(provider.id.clone()))
            .await?;
        info!("Provider '{}' is now the default provider", provider.name);
        self.repository.get_by_id(provider_id)
    }

    fn get(&self, provider_id: &str) -> Result<Provider> {
        self.repository.get_by_id(provider_id)
    }

    fn list(&self, filter: &ProviderFilter) -> Result<Vec<Provider>> {
        Ok(self
            .repository
            .list()?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect())
    }

    async fn remove(&self, provider_id: &str) -> Result<Provider> {
        let removed = self
            .repository
            .soft_delete(provider_id, Utc::now().naive_utc())
            .await?;
        info!("Removed provider '{}' from routing", removed.name);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InMemoryProviderRepository;
    use billpay_vendors::{ServiceCategory, VendorCredentials, VendorOperation};
    use std::collections::BTreeMap;

    fn service() -> ProviderService {
        ProviderService::new(Arc::new(InMemoryProviderRepository::new()))
    }

    fn clubkonnect(name: &str) -> NewProvider {
        NewProvider {
            name: name.to_string(),
            display_name: "Clubkonnect".to_string(),
            credentials: VendorCredentials {
                user_id: Some("CK100".to_string()),
                api_key: Some("secret".to_string()),
                ..Default::default()
            },
            supported_services: vec![ServiceCategory::Data, ServiceCategory::Airtime],
            ..Default::default()
        }
    }

    fn custom(name: &str) -> NewProvider {
        let endpoints: BTreeMap<VendorOperation, String> = [
            (VendorOperation::WalletBalance, "/balance"),
            (VendorOperation::QueryTransaction, "/status"),
            (VendorOperation::DataPurchase, "/data"),
        ]
        .into_iter()
        .map(|(op, path)| (op, path.to_string()))
        .collect();
        NewProvider {
            name: name.to_string(),
            display_name: "Acme".to_string(),
            credentials: VendorCredentials {
                api_key: Some("k".to_string()),
                ..Default::default()
            },
            base_url: Some("https://api.acme.test".to_string()),
            endpoints,
            supported_services: vec![ServiceCategory::Data],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_applies_known_template() {
        let service = service();
        let provider = service.register(clubkonnect("clubkonnect")).await.unwrap();

        assert_eq!(provider.vendor_kind, VendorKind::ClubKonnect);
        assert_eq!(provider.base_url, "https://www.nellobytesystems.com");
        assert_eq!(
            provider.endpoints.get(&VendorOperation::DataPurchase).map(String::as_str),
            Some("/APIDatabundleV1.asp")
        );
        assert!(!provider.is_active);
        assert_eq!(provider.rate_limit, RateLimitPolicy::default());
    }

    #[tokio::test]
    async fn test_register_custom_requires_endpoints() {
        let service = service();
        assert!(service.register(custom("acme")).await.is_ok());

        let mut incomplete = custom("acme-2");
        incomplete.endpoints.remove(&VendorOperation::QueryTransaction);
        let err = service.register(incomplete).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField(ref f)) if f == "endpoints.query-transaction"
        ));

        let mut no_url = custom("acme-3");
        no_url.base_url = None;
        assert!(matches!(
            service.register(no_url).await.unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_register_validation_and_conflict() {
        let service = service();
        service.register(clubkonnect("clubkonnect")).await.unwrap();

        let err = service.register(clubkonnect("clubkonnect")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let mut no_services = clubkonnect("clubkonnect-2");
        no_services.supported_services.clear();
        assert!(matches!(
            service.register(no_services).await.unwrap_err(),
            Error::Validation(_)
        ));

        let mut bad_name = clubkonnect("Club Konnect");
        bad_name.name = "Club Konnect".to_string();
        assert!(service.register(bad_name).await.is_err());

        let mut missing_creds = clubkonnect("clubkonnect-3");
        missing_creds.credentials.user_id = None;
        let err = service.register(missing_creds).await.unwrap_err();
        assert!(err.to_string().contains("credentials.userId"));

        let mut bad_limits = clubkonnect("clubkonnect-4");
        bad_limits.rate_limit = Some(RateLimitPolicy {
            requests_per_minute: 100,
            requests_per_hour: 50,
        });
        assert!(service.register(bad_limits).await.is_err());
    }

    #[tokio::test]
    async fn test_activation_is_exclusive() {
        let service = service();
        let a = service.register(clubkonnect("clubkonnect-a")).await.unwrap();
        let b = service.register(clubkonnect("clubkonnect-b")).await.unwrap();

        service.set_active(&a.id).await.unwrap();
        service.set_active(&b.id).await.unwrap();

        let active = service
            .list(&ProviderFilter {
                is_active: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);

        // activating through update also moves the pointer
        service
            .update(
                &a.id,
                ProviderUpdate {
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(service.get(&a.id).unwrap().is_active);
        assert!(!service.get(&b.id).unwrap().is_active);

        service.clear_active().await.unwrap();
        assert!(!service.get(&a.id).unwrap().is_active);
    }

    #[tokio::test]
    async fn test_default_is_exclusive_and_independent() {
        let service = service();
        let a = service.register(clubkonnect("clubkonnect-a")).await.unwrap();
        let b = service.register(clubkonnect("clubkonnect-b")).await.unwrap();

        service.set_active(&a.id).await.unwrap();
        service.set_default(&a.id).await.unwrap();
        service.set_default(&b.id).await.unwrap();

        let a = service.get(&a.id).unwrap();
        let b = service.get(&b.id).unwrap();
        assert!(a.is_active && !a.is_default);
        assert!(b.is_default && !b.is_active);
    }

    #[tokio::test]
    async fn test_remove_soft_deletes_and_clears_pointers() {
        let service = service();
        let a = service.register(clubkonnect("clubkonnect-a")).await.unwrap();
        service.set_active(&a.id).await.unwrap();
        service.set_default(&a.id).await.unwrap();

        let removed = service.remove(&a.id).await.unwrap();
        assert!(removed.is_removed());
        assert!(!removed.is_active && !removed.is_default);

        // still readable by id, hidden from default listing
        assert!(service.get(&a.id).is_ok());
        assert!(service.list(&ProviderFilter::default()).unwrap().is_empty());
        assert!(matches!(
            service.set_active(&a.id).await.unwrap_err(),
            Error::NotFound(_)
        ));
        // name stays reserved
        assert!(matches!(
            service.register(clubkonnect("clubkonnect-a")).await.unwrap_err(),
            Error::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn test_update_revalidates() {
        let service = service();
        let a = service.register(custom("acme")).await.unwrap();

        let err = service
            .update(
                &a.id,
                ProviderUpdate {
                    supported_services: Some(vec![ServiceCategory::Cable]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("endpoints.cable-purchase"));

        let updated = service
            .update(
                &a.id,
                ProviderUpdate {
                    display_name: Some("Acme Ltd".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Acme Ltd");
    }

    #[tokio::test]
    async fn test_list_filters_by_service() {
        let service = service();
        service.register(clubkonnect("clubkonnect")).await.unwrap();
        service.register(custom("acme")).await.unwrap();

        let airtime = service
            .list(&ProviderFilter {
                service: Some(ServiceCategory::Airtime),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(airtime.len(), 1);
        assert_eq!(airtime[0].name, "clubkonnect");
    }
}
