//! Database models for the provider registry.

use std::collections::BTreeMap;

use billpay_core::health::HealthSnapshot;
use billpay_core::providers::Provider;
use billpay_vendors::{RateLimitPolicy, ServiceCategory, VendorCredentials, VendorKind, VendorOperation};
use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;

/// Database model for providers. Structured fields are stored as JSON text.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::providers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProviderDB {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub vendor_kind: String,
    pub credentials: String,
    pub base_url: String,
    pub endpoints: String,
    pub supported_services: String,
    pub requests_per_minute: i32,
    pub requests_per_hour: i32,
    pub health: String,
    pub removed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Administrator-owned columns rewritten by `update`.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::providers)]
#[diesel(treat_none_as_null = true)]
pub struct ProviderChangesetDB {
    pub display_name: String,
    pub description: Option<String>,
    pub credentials: String,
    pub base_url: String,
    pub endpoints: String,
    pub supported_services: String,
    pub requests_per_minute: i32,
    pub requests_per_hour: i32,
    pub updated_at: NaiveDateTime,
}

/// The single selection row.
#[derive(Queryable, Selectable, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::provider_selection)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SelectionDB {
    pub active_provider_id: Option<String>,
    pub default_provider_id: Option<String>,
}

fn to_db_limit(value: u32) -> Result<i32, StorageError> {
    i32::try_from(value)
        .map_err(|_| StorageError::SerializationError(format!("rate limit {} is too large", value)))
}

fn from_db_limit(value: i32) -> Result<u32, StorageError> {
    u32::try_from(value)
        .map_err(|_| StorageError::SerializationError(format!("stored rate limit {} is negative", value)))
}

impl ProviderDB {
    pub fn from_domain(provider: &Provider) -> Result<Self, StorageError> {
        Ok(Self {
            id: provider.id.clone(),
            name: provider.name.clone(),
            display_name: provider.display_name.clone(),
            description: provider.description.clone(),
            vendor_kind: provider.vendor_kind.as_str().to_string(),
            credentials: serde_json::to_string(&provider.credentials)?,
            base_url: provider.base_url.clone(),
            endpoints: serde_json::to_string(&provider.endpoints)?,
            supported_services: serde_json::to_string(&provider.supported_services)?,
            requests_per_minute: to_db_limit(provider.rate_limit.requests_per_minute)?,
            requests_per_hour: to_db_limit(provider.rate_limit.requests_per_hour)?,
            health: serde_json::to_string(&provider.health)?,
            removed_at: provider.removed_at,
            created_at: provider.created_at,
            updated_at: provider.updated_at,
        })
    }

    /// Convert to the domain model, deriving the selection flags.
    pub fn into_domain(self, selection: &SelectionDB) -> Result<Provider, StorageError> {
        let vendor_kind = self
            .vendor_kind
            .parse::<VendorKind>()
            .map_err(StorageError::SerializationError)?;
        let credentials: VendorCredentials = serde_json::from_str(&self.credentials)?;
        let endpoints: BTreeMap<VendorOperation, String> = serde_json::from_str(&self.endpoints)?;
        let supported_services: Vec<ServiceCategory> =
            serde_json::from_str(&self.supported_services)?;
        let health: HealthSnapshot = serde_json::from_str(&self.health)?;

        Ok(Provider {
            is_active: selection.active_provider_id.as_deref() == Some(self.id.as_str()),
            is_default: selection.default_provider_id.as_deref() == Some(self.id.as_str()),
            id: self.id,
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            vendor_kind,
            credentials,
            base_url: self.base_url,
            endpoints,
            supported_services,
            rate_limit: RateLimitPolicy {
                requests_per_minute: from_db_limit(self.requests_per_minute)?,
                requests_per_hour: from_db_limit(self.requests_per_hour)?,
            },
            health,
            removed_at: self.removed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ProviderChangesetDB {
    pub fn from_domain(provider: &Provider) -> Result<Self, StorageError> {
        let row = ProviderDB::from_domain(provider)?;
        Ok(Self {
            display_name: row.display_name,
            description: row.description,
            credentials: row.credentials,
            base_url: row.base_url,
            endpoints: row.endpoints,
            supported_services: row.supported_services,
            requests_per_minute: row.requests_per_minute,
            requests_per_hour: row.requests_per_hour,
            updated_at: row.updated_at,
        })
    }
}
