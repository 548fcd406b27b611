//! In-memory provider repository.
//!
//! Used by tests and by embedders that do not need persistence. All state
//! sits behind a single lock so pointer updates are atomic with record
//! writes, mirroring the transactional SQLite implementation.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::warn;

use super::providers_model::{Provider, SelectionChange};
use super::providers_traits::ProviderRepositoryTrait;
use crate::errors::{Error, Result};
use crate::health::HealthSnapshot;

#[derive(Default)]
struct RegistryState {
    providers: HashMap<String, Provider>,
    active_id: Option<String>,
    default_id: Option<String>,
}

impl RegistryState {
    fn project(&self, provider: &Provider) -> Provider {
        let mut out = provider.clone();
        out.is_active = self.active_id.as_deref() == Some(provider.id.as_str());
        out.is_default = self.default_id.as_deref() == Some(provider.id.as_str());
        out
    }

    fn apply_selection(&mut self, id: &str, selection: SelectionChange) {
        match selection.active {
            Some(true) => self.active_id = Some(id.to_string()),
            Some(false) if self.active_id.as_deref() == Some(id) => self.active_id = None,
            _ => {}
        }
        match selection.default {
            Some(true) => self.default_id = Some(id.to_string()),
            Some(false) if self.default_id.as_deref() == Some(id) => self.default_id = None,
            _ => {}
        }
    }

    fn live(&self, provider_id: &str) -> Result<&Provider> {
        match self.providers.get(provider_id) {
            Some(p) if !p.is_removed() => Ok(p),
            _ => Err(Error::not_found(format!("provider {}", provider_id))),
        }
    }
}

#[derive(Default)]
pub struct InMemoryProviderRepository {
    state: RwLock<RegistryState>,
}

impl InMemoryProviderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Provider registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("Provider registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl ProviderRepositoryTrait for InMemoryProviderRepository {
    fn get_by_id(&self, provider_id: &str) -> Result<Provider> {
        let state = self.read();
        state
            .providers
            .get(provider_id)
            .map(|p| state.project(p))
            .ok_or_else(|| Error::not_found(format!("provider {}", provider_id)))
    }

    fn get_by_name(&self, name: &str) -> Result<Option<Provider>> {
        let state = self.read();
        Ok(state
            .providers
            .values()
            .find(|p| p.name == name)
            .map(|p| state.project(p)))
    }

    fn list(&self) -> Result<Vec<Provider>> {
        let state = self.read();
        let mut providers: Vec<Provider> =
            state.providers.values().map(|p| state.project(p)).collect();
        providers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(providers)
    }

    async fn create(&self, provider: Provider) -> Result<Provider> {
        let mut state = self.write();
        if state.providers.values().any(|p| p.name == provider.name) {
            return Err(Error::Conflict(format!(
                "provider name '{}' already exists",
                provider.name
            )));
        }
        let selection = SelectionChange {
            active: Some(provider.is_active),
            default: Some(provider.is_default),
        };
        state.apply_selection(&provider.id, selection);
        state.providers.insert(provider.id.clone(), provider.clone());
        Ok(state.project(&provider))
    }

    async fn update(&self, provider: Provider, selection: SelectionChange) -> Result<Provider> {
        let mut state = self.write();
        let existing = state.live(&provider.id)?;
        let stored = Provider {
            health: existing.health.clone(),
            created_at: existing.created_at,
            removed_at: existing.removed_at,
            ..provider
        };
        state.apply_selection(&stored.id, selection);
        state.providers.insert(stored.id.clone(), stored.clone());
        Ok(state.project(&stored))
    }

    async fn set_active(&self, provider_id: Option<String>) -> Result<()> {
        let mut state = self.write();
        if let Some(id) = &provider_id {
            state.live(id)?;
        }
        state.active_id = provider_id;
        Ok(())
    }

    async fn set_default(&self, provider_id: Option<String>) -> Result<()> {
        let mut state = self.write();
        if let Some(id) = &provider_id {
            state.live(id)?;
        }
        state.default_id = provider_id;
        Ok(())
    }

    async fn soft_delete(
        &self,
        provider_id: &str,
        removed_at: NaiveDateTime,
    ) -> Result<Provider> {
        let mut state = self.write();
        state.live(provider_id)?;
        if state.active_id.as_deref() == Some(provider_id) {
            state.active_id = None;
        }
        if state.default_id.as_deref() == Some(provider_id) {
            state.default_id = None;
        }
        let provider = state
            .providers
            .get_mut(provider_id)
            .ok_or_else(|| Error::not_found(format!("provider {}", provider_id)))?;
        provider.removed_at = Some(removed_at);
        provider.updated_at = removed_at;
        let removed = provider.clone();
        Ok(state.project(&removed))
    }

    async fn update_health(&self, provider_id: &str, snapshot: HealthSnapshot) -> Result<()> {
        let mut state = self.write();
        let provider = state
            .providers
            .get_mut(provider_id)
            .ok_or_else(|| Error::not_found(format!("provider {}", provider_id)))?;
        provider.health = snapshot;
        Ok(())
    }
}
