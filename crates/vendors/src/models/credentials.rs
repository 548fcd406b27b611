use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque credential bundle for a vendor account.
///
/// `Debug` never prints secret material, so the bundle is safe to include
/// in structs that get logged.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorCredentials {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
}

impl VendorCredentials {
    fn present(value: &Option<String>) -> bool {
        value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
    }

    pub fn has_user_id(&self) -> bool {
        Self::present(&self.user_id)
    }

    pub fn has_api_key(&self) -> bool {
        Self::present(&self.api_key)
    }

    pub fn has_secret_key(&self) -> bool {
        Self::present(&self.secret_key)
    }

    pub fn has_public_key(&self) -> bool {
        Self::present(&self.public_key)
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    pub fn secret_key(&self) -> &str {
        self.secret_key.as_deref().unwrap_or_default()
    }

    pub fn public_key(&self) -> &str {
        self.public_key.as_deref().unwrap_or_default()
    }

    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or_default()
    }

    /// Copy with every secret replaced by a fixed mask, keeping the user id.
    pub fn masked(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        Self {
            user_id: self.user_id.clone(),
            api_key: mask(&self.api_key),
            secret_key: mask(&self.secret_key),
            public_key: mask(&self.public_key),
        }
    }
}

impl fmt::Debug for VendorCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |present: bool| if present { "<redacted>" } else { "<none>" };
        f.debug_struct("VendorCredentials")
            .field("user_id", &self.user_id)
            .field("api_key", &redact(self.has_api_key()))
            .field("secret_key", &redact(self.has_secret_key()))
            .field("public_key", &redact(self.has_public_key()))
            .finish()
    }
}
