//! Provider domain models.

use std::collections::BTreeMap;
use std::time::Duration;

use billpay_vendors::{
    required_operations, HealthStatus, RateLimitPolicy, ServiceCategory, VendorContext,
    VendorCredentials, VendorKind, VendorOperation,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::errors::{Result, ValidationError};
use crate::health::HealthSnapshot;

/// Domain model representing one configured vendor account.
///
/// `is_active` and `is_default` are projections of the registry-wide
/// selection pointers; storage never keeps them as independent flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    /// Stable slug, unique across the registry (including removed providers).
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub vendor_kind: VendorKind,
    pub credentials: VendorCredentials,
    pub base_url: String,
    pub endpoints: BTreeMap<VendorOperation, String>,
    pub supported_services: Vec<ServiceCategory>,
    pub is_active: bool,
    pub is_default: bool,
    pub rate_limit: RateLimitPolicy,
    pub health: HealthSnapshot,
    pub removed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Provider {
    pub fn supports(&self, category: ServiceCategory) -> bool {
        self.supported_services.contains(&category)
    }

    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    pub fn health_status(&self) -> HealthStatus {
        self.health.status
    }

    /// Eligible for routing `category`, ignoring health.
    pub fn serves(&self, category: ServiceCategory) -> bool {
        !self.is_removed() && self.supports(category)
    }

    /// Snapshot handed to the adapter for one call.
    pub fn vendor_context(&self, timeout: Duration) -> VendorContext {
        VendorContext {
            provider_id: Cow::Owned(self.id.clone()),
            provider_name: self.name.clone(),
            base_url: self.base_url.clone(),
            endpoints: self.endpoints.clone(),
            credentials: self.credentials.clone(),
            timeout,
        }
    }

    /// Copy safe to return from read APIs.
    pub fn masked(&self) -> Self {
        Self {
            credentials: self.credentials.masked(),
            ..self.clone()
        }
    }

    /// Check the invariants every stored provider satisfies.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if self.display_name.trim().is_empty() {
            return Err(ValidationError::MissingField("displayName".to_string()).into());
        }
        let missing = self.vendor_kind.missing_credentials(&self.credentials);
        if !missing.is_empty() {
            return Err(ValidationError::MissingField(format!(
                "credentials.{}",
                missing.join(", credentials.")
            ))
            .into());
        }
        if self.supported_services.is_empty() {
            return Err(ValidationError::invalid(
                "at least one supported service is required",
            )
            .into());
        }
        validate_base_url(&self.base_url)?;
        for operation in required_operations(&self.supported_services) {
            let configured = self
                .endpoints
                .get(&operation)
                .is_some_and(|path| !path.trim().is_empty());
            if !configured {
                return Err(ValidationError::MissingField(format!(
                    "endpoints.{}",
                    operation
                ))
                .into());
            }
        }
        validate_rate_limit(&self.rate_limit)
    }
}

/// Input model for registering a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProvider {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub credentials: VendorCredentials,
    /// Falls back to the vendor template's base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Merged over the vendor template's endpoints.
    #[serde(default)]
    pub endpoints: BTreeMap<VendorOperation, String>,
    #[serde(default)]
    pub supported_services: Vec<ServiceCategory>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitPolicy>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
}

impl NewProvider {
    /// Validates the shape of the input before any template is applied.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        if self.display_name.trim().is_empty() {
            return Err(ValidationError::MissingField("displayName".to_string()).into());
        }
        if self.supported_services.is_empty() {
            return Err(ValidationError::invalid(
                "at least one supported service is required",
            )
            .into());
        }
        Ok(())
    }
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub credentials: Option<VendorCredentials>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Entries are merged; an empty path removes the operation.
    #[serde(default)]
    pub endpoints: Option<BTreeMap<VendorOperation, String>>,
    #[serde(default)]
    pub supported_services: Option<Vec<ServiceCategory>>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitPolicy>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

impl ProviderUpdate {
    pub fn selection(&self) -> SelectionChange {
        SelectionChange {
            active: self.is_active,
            default: self.is_default,
        }
    }

    /// Apply the patch to a copy of `provider`.
    pub fn apply_to(&self, provider: &Provider) -> Provider {
        let mut updated = provider.clone();
        if let Some(display_name) = &self.display_name {
            updated.display_name = display_name.trim().to_string();
        }
        if let Some(description) = &self.description {
            updated.description = Some(description.clone()).filter(|d| !d.trim().is_empty());
        }
        if let Some(credentials) = &self.credentials {
            updated.credentials = credentials.clone();
        }
        if let Some(base_url) = &self.base_url {
            updated.base_url = base_url.trim().to_string();
        }
        if let Some(endpoints) = &self.endpoints {
            for (operation, path) in endpoints {
                if path.trim().is_empty() {
                    updated.endpoints.remove(operation);
                } else {
                    updated.endpoints.insert(*operation, path.trim().to_string());
                }
            }
        }
        if let Some(services) = &self.supported_services {
            updated.supported_services = dedupe_services(services);
        }
        if let Some(rate_limit) = self.rate_limit {
            updated.rate_limit = rate_limit;
        }
        if let Some(is_active) = self.is_active {
            updated.is_active = is_active;
        }
        if let Some(is_default) = self.is_default {
            updated.is_default = is_default;
        }
        updated
    }
}

/// Selection changes requested alongside a record update.
///
/// `Some(true)` points the selection at the record, `Some(false)` clears it
/// only if it currently points at the record, `None` leaves it untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionChange {
    pub active: Option<bool>,
    pub default: Option<bool>,
}

impl SelectionChange {
    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.default.is_none()
    }
}

/// Read filter for `list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFilter {
    #[serde(default)]
    pub service: Option<ServiceCategory>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub include_removed: bool,
}

impl ProviderFilter {
    pub fn matches(&self, provider: &Provider) -> bool {
        if !self.include_removed && provider.is_removed() {
            return false;
        }
        if let Some(service) = self.service {
            if !provider.supports(service) {
                return false;
            }
        }
        if let Some(is_active) = self.is_active {
            if provider.is_active != is_active {
                return false;
            }
        }
        true
    }
}

/// Keep first occurrence order.
pub fn dedupe_services(services: &[ServiceCategory]) -> Vec<ServiceCategory> {
    let mut out = Vec::with_capacity(services.len());
    for service in services {
        if !out.contains(service) {
            out.push(*service);
        }
    }
    out
}

/// Lowercase slug: letters, digits, `-` and `_`, starting with a letter or digit.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::invalid(format!(
            "name '{}' must be a lowercase slug (a-z, 0-9, '-', '_')",
            name
        ))
        .into())
    }
}

pub fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| ValidationError::invalid(format!("baseUrl '{}': {}", base_url, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::invalid(format!(
            "baseUrl '{}' must use http or https",
            base_url
        ))
        .into());
    }
    Ok(())
}

pub fn validate_rate_limit(policy: &RateLimitPolicy) -> Result<()> {
    if policy.requests_per_minute == 0 {
        return Err(ValidationError::invalid("requestsPerMinute must be positive").into());
    }
    if policy.requests_per_minute > policy.requests_per_hour {
        return Err(ValidationError::invalid(
            "requestsPerMinute must not exceed requestsPerHour",
        )
        .into());
    }
    Ok(())
}
