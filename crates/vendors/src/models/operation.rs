use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ServiceCategory;

/// Logical operation a vendor integration exposes.
///
/// Every provider maps each operation it supports to a relative endpoint
/// path; the adapter translates the uniform payload into that vendor's
/// HTTP contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VendorOperation {
    WalletBalance,
    DataPurchase,
    AirtimePurchase,
    CablePurchase,
    ElectricityPurchase,
    QueryTransaction,
    ListPlans,
}

impl VendorOperation {
    pub const ALL: [VendorOperation; 7] = [
        VendorOperation::WalletBalance,
        VendorOperation::DataPurchase,
        VendorOperation::AirtimePurchase,
        VendorOperation::CablePurchase,
        VendorOperation::ElectricityPurchase,
        VendorOperation::QueryTransaction,
        VendorOperation::ListPlans,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorOperation::WalletBalance => "wallet-balance",
            VendorOperation::DataPurchase => "data-purchase",
            VendorOperation::AirtimePurchase => "airtime-purchase",
            VendorOperation::CablePurchase => "cable-purchase",
            VendorOperation::ElectricityPurchase => "electricity-purchase",
            VendorOperation::QueryTransaction => "query-transaction",
            VendorOperation::ListPlans => "list-plans",
        }
    }

    /// Service category purchased by this operation, if it is a purchase.
    pub fn purchased_service(&self) -> Option<ServiceCategory> {
        match self {
            VendorOperation::DataPurchase => Some(ServiceCategory::Data),
            VendorOperation::AirtimePurchase => Some(ServiceCategory::Airtime),
            VendorOperation::CablePurchase => Some(ServiceCategory::Cable),
            VendorOperation::ElectricityPurchase => Some(ServiceCategory::Electricity),
            _ => None,
        }
    }

    pub fn is_purchase(&self) -> bool {
        self.purchased_service().is_some()
    }
}

impl fmt::Display for VendorOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VendorOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VendorOperation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown vendor operation: {}", s))
    }
}

/// Uniform request payload handed to a vendor adapter.
///
/// Purchases use `service_key` for the network/disco/bouquet provider
/// (e.g. "mtn", "ikeja", "dstv"), `recipient` for the phone, meter or
/// smartcard number, and `variation_code` for data plans, cable packages
/// and prepaid/postpaid meter types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPayload {
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub variation_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl VendorPayload {
    pub fn require_service_key(&self) -> Result<&str, String> {
        self.service_key
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| "serviceKey is required".to_string())
    }

    pub fn require_recipient(&self) -> Result<&str, String> {
        self.recipient
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| "recipient is required".to_string())
    }

    pub fn require_amount(&self) -> Result<Decimal, String> {
        match self.amount {
            Some(amount) if amount > Decimal::ZERO => Ok(amount),
            Some(_) => Err("amount must be positive".to_string()),
            None => Err("amount is required".to_string()),
        }
    }
}

/// Vendor-side state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Value delivered to the recipient.
    Delivered,
    /// Accepted by the vendor but not yet final.
    Pending,
    /// Vendor rejected or reversed the transaction.
    Failed,
    /// Vendor has no record of the request id.
    NotFound,
}

impl TransactionStatus {
    pub fn is_final(&self) -> bool {
        matches!(self, TransactionStatus::Delivered | TransactionStatus::Failed)
    }
}

/// Uniform result of a vendor call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorResult {
    pub operation: VendorOperation,
    pub status: TransactionStatus,
    /// Vendor's own transaction/order reference, when returned.
    pub vendor_reference: Option<String>,
    pub message: Option<String>,
    /// Wallet balance reported by the vendor (balance queries only).
    pub balance: Option<Decimal>,
    /// Raw response body for auditing.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl VendorResult {
    pub fn new(operation: VendorOperation, status: TransactionStatus) -> Self {
        Self {
            operation,
            status,
            vendor_reference: None,
            message: None,
            balance: None,
            raw: serde_json::Value::Null,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.vendor_reference = Some(reference.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }
}
