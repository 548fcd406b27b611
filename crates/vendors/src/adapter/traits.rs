//! Vendor adapter trait definitions.
//!
//! This module defines the `VendorAdapter` trait every vendor integration
//! implements, and the per-call `VendorContext` snapshot it receives.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use super::kind::VendorKind;
use crate::errors::VendorError;
use crate::models::{
    ProviderId, ServiceCategory, VendorCredentials, VendorOperation, VendorPayload, VendorResult,
};

/// Everything an adapter needs to make one call against one provider.
///
/// Built from the provider record at dispatch time. Because it is a
/// snapshot, credential or endpoint changes made while a call is in
/// flight never affect that call.
#[derive(Debug, Clone)]
pub struct VendorContext {
    pub provider_id: ProviderId,
    /// Provider name, used in error messages and logs.
    pub provider_name: String,
    pub base_url: String,
    pub endpoints: BTreeMap<VendorOperation, String>,
    pub credentials: VendorCredentials,
    pub timeout: Duration,
}

impl VendorContext {
    /// Absolute URL for an operation.
    pub fn endpoint_url(&self, operation: VendorOperation) -> Result<String, VendorError> {
        let path = self
            .endpoints
            .get(&operation)
            .ok_or_else(|| VendorError::MissingEndpoint {
                operation: operation.to_string(),
                provider: self.provider_name.clone(),
            })?;
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path.clone());
        }
        Ok(format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    pub fn invalid_request(&self, message: impl Into<String>) -> VendorError {
        VendorError::InvalidRequest {
            provider: self.provider_name.clone(),
            message: message.into(),
        }
    }
}

/// Capability every vendor integration implements.
///
/// Adapters are stateless apart from their HTTP client; all per-provider
/// configuration arrives through [`VendorContext`].
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use billpay_vendors::adapter::{VendorAdapter, VendorContext, VendorKind};
///
/// struct EchoAdapter;
///
/// #[async_trait]
/// impl VendorAdapter for EchoAdapter {
///     fn kind(&self) -> VendorKind {
///         VendorKind::Custom
///     }
///
///     // ... implement balance, purchase and query
/// }
/// ```
#[async_trait]
pub trait VendorAdapter: Send + Sync {
    /// The vendor variant this adapter speaks to.
    fn kind(&self) -> VendorKind;

    /// Query the reseller wallet balance. Also used as the health probe.
    async fn balance(&self, ctx: &VendorContext) -> Result<VendorResult, VendorError>;

    /// Submit a purchase under the caller's request id.
    async fn purchase(
        &self,
        ctx: &VendorContext,
        service: ServiceCategory,
        request_id: &str,
        payload: &VendorPayload,
    ) -> Result<VendorResult, VendorError>;

    /// Look up the vendor-side state of a previously submitted request id.
    async fn query(&self, ctx: &VendorContext, request_id: &str)
        -> Result<VendorResult, VendorError>;

    /// List purchasable plans/variations for a service key.
    ///
    /// Default implementation returns `NotSupported`.
    async fn list_plans(
        &self,
        ctx: &VendorContext,
        payload: &VendorPayload,
    ) -> Result<VendorResult, VendorError> {
        let _ = payload;
        Err(VendorError::NotSupported {
            operation: VendorOperation::ListPlans.to_string(),
            provider: ctx.provider_name.clone(),
        })
    }

    /// Dispatch a uniform operation to the matching method.
    ///
    /// Purchases and requeries need a request id; other operations
    /// ignore it.
    async fn call(
        &self,
        ctx: &VendorContext,
        operation: VendorOperation,
        payload: &VendorPayload,
        request_id: Option<&str>,
    ) -> Result<VendorResult, VendorError> {
        match operation {
            VendorOperation::WalletBalance => self.balance(ctx).await,
            VendorOperation::ListPlans => self.list_plans(ctx, payload).await,
            VendorOperation::QueryTransaction => {
                let request_id =
                    request_id.ok_or_else(|| ctx.invalid_request("requestId is required"))?;
                self.query(ctx, request_id).await
            }
            purchase => {
                let service = purchase
                    .purchased_service()
                    .ok_or_else(|| ctx.invalid_request("unsupported operation"))?;
                let request_id =
                    request_id.ok_or_else(|| ctx.invalid_request("requestId is required"))?;
                self.purchase(ctx, service, request_id, payload).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn context(base_url: &str) -> VendorContext {
        VendorContext {
            provider_id: Cow::Borrowed("p1"),
            provider_name: "vendor-a".to_string(),
            base_url: base_url.to_string(),
            endpoints: VendorKind::VtPass.default_endpoints(),
            credentials: VendorCredentials::default(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_endpoint_url_joins_slashes() {
        let ctx = context("https://vtpass.com/api/");
        assert_eq!(
            ctx.endpoint_url(VendorOperation::WalletBalance).unwrap(),
            "https://vtpass.com/api/balance"
        );
    }

    #[test]
    fn test_endpoint_url_accepts_absolute_override() {
        let mut ctx = context("https://vtpass.com/api");
        ctx.endpoints.insert(
            VendorOperation::QueryTransaction,
            "https://status.example.com/q".to_string(),
        );
        assert_eq!(
            ctx.endpoint_url(VendorOperation::QueryTransaction).unwrap(),
            "https://status.example.com/q"
        );
    }

    #[test]
    fn test_missing_endpoint() {
        let mut ctx = context("https://example.com");
        ctx.endpoints.clear();
        let err = ctx.endpoint_url(VendorOperation::DataPurchase).unwrap_err();
        assert!(matches!(err, VendorError::MissingEndpoint { .. }));
    }
}
