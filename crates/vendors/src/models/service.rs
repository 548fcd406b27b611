use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::VendorOperation;

/// A category of utility service resold through an upstream vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Airtime,
    Data,
    Cable,
    Electricity,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 4] = [
        ServiceCategory::Airtime,
        ServiceCategory::Data,
        ServiceCategory::Cable,
        ServiceCategory::Electricity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Airtime => "airtime",
            ServiceCategory::Data => "data",
            ServiceCategory::Cable => "cable",
            ServiceCategory::Electricity => "electricity",
        }
    }

    /// The vendor operation that purchases this service.
    pub fn purchase_operation(&self) -> VendorOperation {
        match self {
            ServiceCategory::Airtime => VendorOperation::AirtimePurchase,
            ServiceCategory::Data => VendorOperation::DataPurchase,
            ServiceCategory::Cable => VendorOperation::CablePurchase,
            ServiceCategory::Electricity => VendorOperation::ElectricityPurchase,
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "airtime" => Ok(ServiceCategory::Airtime),
            "data" => Ok(ServiceCategory::Data),
            "cable" | "cabletv" | "tv" => Ok(ServiceCategory::Cable),
            "electricity" | "power" => Ok(ServiceCategory::Electricity),
            other => Err(format!("Unknown service category: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Airtime".parse::<ServiceCategory>(), Ok(ServiceCategory::Airtime));
        assert_eq!("cabletv".parse::<ServiceCategory>(), Ok(ServiceCategory::Cable));
        assert_eq!("power".parse::<ServiceCategory>(), Ok(ServiceCategory::Electricity));
        assert!("insurance".parse::<ServiceCategory>().is_err());
    }

    #[test]
    fn test_serde_is_lowercase() {
        let json = serde_json::to_string(&ServiceCategory::Electricity).unwrap();
        assert_eq!(json, "\"electricity\"");
    }
}
