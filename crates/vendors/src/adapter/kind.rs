//! Known vendor variants and their endpoint templates.
//!
//! A provider's kind is fixed at registration from its name. Known vendors
//! carry a default base URL, endpoint paths for every operation and a
//! credential profile; `Custom` providers must configure all of it by hand.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{ServiceCategory, VendorCredentials, VendorOperation};

/// Tagged vendor variant selecting the adapter implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorKind {
    VtPass,
    ClubKonnect,
    Custom,
}

const VTPASS_ENDPOINTS: &[(VendorOperation, &str)] = &[
    (VendorOperation::WalletBalance, "/balance"),
    (VendorOperation::DataPurchase, "/pay"),
    (VendorOperation::AirtimePurchase, "/pay"),
    (VendorOperation::CablePurchase, "/pay"),
    (VendorOperation::ElectricityPurchase, "/pay"),
    (VendorOperation::QueryTransaction, "/requery"),
    (VendorOperation::ListPlans, "/service-variations"),
];

const CLUBKONNECT_ENDPOINTS: &[(VendorOperation, &str)] = &[
    (VendorOperation::WalletBalance, "/APIWalletBalanceV1.asp"),
    (VendorOperation::DataPurchase, "/APIDatabundleV1.asp"),
    (VendorOperation::AirtimePurchase, "/APIAirtimeV1.asp"),
    (VendorOperation::CablePurchase, "/APICableTVV1.asp"),
    (VendorOperation::ElectricityPurchase, "/APIElectricityV1.asp"),
    (VendorOperation::QueryTransaction, "/APIQueryV1.asp"),
    (VendorOperation::ListPlans, "/APIDatabundlePlansV2.asp"),
];

impl VendorKind {
    /// Select the variant for a provider name.
    ///
    /// Matching is by prefix so sandbox/secondary accounts such as
    /// `vtpass-sandbox` still pick up the VTPass template.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        if name.starts_with("vtpass") {
            VendorKind::VtPass
        } else if name.starts_with("clubkonnect") || name.starts_with("nellobytes") {
            VendorKind::ClubKonnect
        } else {
            VendorKind::Custom
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorKind::VtPass => "vt_pass",
            VendorKind::ClubKonnect => "club_konnect",
            VendorKind::Custom => "custom",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, VendorKind::Custom)
    }

    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            VendorKind::VtPass => Some("https://vtpass.com/api"),
            VendorKind::ClubKonnect => Some("https://www.nellobytesystems.com"),
            VendorKind::Custom => None,
        }
    }

    /// Endpoint template for this vendor; empty for `Custom`.
    pub fn default_endpoints(&self) -> BTreeMap<VendorOperation, String> {
        let template: &[(VendorOperation, &str)] = match self {
            VendorKind::VtPass => VTPASS_ENDPOINTS,
            VendorKind::ClubKonnect => CLUBKONNECT_ENDPOINTS,
            VendorKind::Custom => &[],
        };
        template
            .iter()
            .map(|(op, path)| (*op, path.to_string()))
            .collect()
    }

    /// Names of credential fields this vendor needs that are absent.
    pub fn missing_credentials(&self, credentials: &VendorCredentials) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self {
            VendorKind::VtPass => {
                if !credentials.has_api_key() {
                    missing.push("apiKey");
                }
                if !credentials.has_secret_key() {
                    missing.push("secretKey");
                }
                if !credentials.has_public_key() {
                    missing.push("publicKey");
                }
            }
            VendorKind::ClubKonnect => {
                if !credentials.has_user_id() {
                    missing.push("userId");
                }
                if !credentials.has_api_key() {
                    missing.push("apiKey");
                }
            }
            VendorKind::Custom => {
                if !credentials.has_api_key() {
                    missing.push("apiKey");
                }
            }
        }
        missing
    }
}

impl fmt::Display for VendorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VendorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "vt_pass" => Ok(VendorKind::VtPass),
            "club_konnect" => Ok(VendorKind::ClubKonnect),
            "custom" => Ok(VendorKind::Custom),
            other => Err(format!("Unknown vendor kind: {}", other)),
        }
    }
}

/// Operations a provider must have endpoints for to serve `services`.
///
/// Balance and requery are always required: the first backs health probes,
/// the second backs idempotent retries.
pub fn required_operations(services: &[ServiceCategory]) -> Vec<VendorOperation> {
    let mut ops = vec![
        VendorOperation::WalletBalance,
        VendorOperation::QueryTransaction,
    ];
    for service in services {
        let op = service.purchase_operation();
        if !ops.contains(&op) {
            ops.push(op);
        }
    }
    ops
}
