use std::collections::BTreeMap;

use billpay_vendors::{ServiceCategory, VendorPayload, VendorResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::execution::ExecutionSource;
use crate::providers::Provider;
use crate::routing::RoutingReason;

/// A purchase as submitted by the checkout flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub service: ServiceCategory,
    /// Network, disco or bouquet.
    #[serde(default)]
    pub key: Option<String>,
    /// Nominal service value.
    pub amount: Decimal,
    pub idempotency_key: String,
    /// Phone, meter or smartcard number.
    pub recipient: String,
    #[serde(default)]
    pub variation_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl CheckoutRequest {
    pub(crate) fn payload(&self) -> VendorPayload {
        VendorPayload {
            service_key: self.key.clone(),
            recipient: Some(self.recipient.clone()),
            amount: Some(self.amount),
            variation_code: self.variation_code.clone(),
            phone: self.phone.clone(),
            extra: self.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUsed {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

impl From<&Provider> for ProviderUsed {
    fn from(provider: &Provider) -> Self {
        Self {
            id: provider.id.clone(),
            name: provider.name.clone(),
            display_name: provider.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub charged_amount: Decimal,
    pub commission: Decimal,
    pub provider_used: ProviderUsed,
    pub routing_reason: RoutingReason,
    pub source: ExecutionSource,
    pub vendor_result: VendorResult,
}
