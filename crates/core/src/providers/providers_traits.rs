use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::providers_model::{
    NewProvider, Provider, ProviderFilter, ProviderUpdate, SelectionChange,
};
use crate::errors::Result;
use crate::health::HealthSnapshot;

/// Trait for provider repository operations.
///
/// The repository owns two registry-wide pointers, the active provider and
/// the default provider. `is_active`/`is_default` on a record passed to
/// `create`, and the [`SelectionChange`] passed to `update`, are applied to
/// those pointers in the same atomic write as the record itself. On read
/// the flags are derived from the pointers.
#[async_trait]
pub trait ProviderRepositoryTrait: Send + Sync {
    fn get_by_id(&self, provider_id: &str) -> Result<Provider>;
    fn get_by_name(&self, name: &str) -> Result<Option<Provider>>;
    /// All providers, removed ones included.
    fn list(&self) -> Result<Vec<Provider>>;

    /// Insert a provider. Fails with `Conflict` when the name is taken.
    async fn create(&self, provider: Provider) -> Result<Provider>;
    /// Replace the administrator-owned fields of a provider.
    async fn update(&self, provider: Provider, selection: SelectionChange) -> Result<Provider>;
    /// Point the active selection at `provider_id`, or clear it.
    async fn set_active(&self, provider_id: Option<String>) -> Result<()>;
    /// Point the default selection at `provider_id`, or clear it.
    async fn set_default(&self, provider_id: Option<String>) -> Result<()>;
    /// Mark a provider removed and drop any selection pointing at it.
    async fn soft_delete(&self, provider_id: &str, removed_at: NaiveDateTime)
        -> Result<Provider>;
    /// Overwrite only the health snapshot.
    async fn update_health(&self, provider_id: &str, snapshot: HealthSnapshot) -> Result<()>;
}

/// Trait for provider registry operations.
#[async_trait]
pub trait ProviderServiceTrait: Send + Sync {
    async fn register(&self, new_provider: NewProvider) -> Result<Provider>;
    async fn update(&self, provider_id: &str, patch: ProviderUpdate) -> Result<Provider>;
    /// Make `provider_id` the only active provider.
    async fn set_active(&self, provider_id: &str) -> Result<Provider>;
    async fn clear_active(&self) -> Result<()>;
    /// Make `provider_id` the only default provider.
    async fn set_default(&self, provider_id: &str) -> Result<Provider>;
    fn get(&self, provider_id: &str) -> Result<Provider>;
    fn list(&self, filter: &ProviderFilter) -> Result<Vec<Provider>>;
    async fn remove(&self, provider_id: &str) -> Result<Provider>;
}
