//! Generic JSON adapter for vendors without a bundled template.
//!
//! Custom providers configure every endpoint themselves. Requests are JSON
//! POSTs authenticated with `Authorization: Bearer <apiKey>`; responses are
//! expected in a uniform envelope:
//!
//! ```json
//! {"status": "delivered", "reference": "abc", "message": "ok", "balance": "100.00"}
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use super::http::{build_client, decimal_field, send_json, string_field};
use super::{VendorAdapter, VendorContext, VendorKind};
use crate::errors::VendorError;
use crate::models::{
    ServiceCategory, TransactionStatus, VendorOperation, VendorPayload, VendorResult,
};

pub struct CustomAdapter {
    client: Client,
}

impl CustomAdapter {
    pub fn new() -> Self {
        Self {
            client: build_client(),
        }
    }

    fn post(&self, ctx: &VendorContext, url: &str) -> RequestBuilder {
        let request = self.client.post(url);
        if ctx.credentials.has_api_key() {
            request.bearer_auth(ctx.credentials.api_key())
        } else {
            request
        }
    }

    fn parse(
        provider: &str,
        operation: VendorOperation,
        body: Value,
    ) -> Result<VendorResult, VendorError> {
        let raw_status = string_field(&body, "status").ok_or_else(|| {
            VendorError::InvalidResponse {
                provider: provider.to_string(),
                message: "missing status".to_string(),
            }
        })?;
        let status = match raw_status.to_ascii_lowercase().as_str() {
            "delivered" | "success" | "successful" | "completed" => TransactionStatus::Delivered,
            "pending" | "processing" | "initiated" => TransactionStatus::Pending,
            "failed" | "reversed" | "cancelled" => TransactionStatus::Failed,
            "not_found" | "notfound" => TransactionStatus::NotFound,
            "error" | "rejected" => {
                return Err(VendorError::ProviderError {
                    provider: provider.to_string(),
                    message: string_field(&body, "message").unwrap_or(raw_status),
                })
            }
            other => {
                return Err(VendorError::InvalidResponse {
                    provider: provider.to_string(),
                    message: format!("unrecognised status '{}'", other),
                })
            }
        };

        let mut result = VendorResult::new(operation, status);
        if let Some(reference) = string_field(&body, "reference") {
            result = result.with_reference(reference);
        }
        if let Some(message) = string_field(&body, "message") {
            result = result.with_message(message);
        }
        if let Some(balance) = decimal_field(&body, "balance") {
            result = result.with_balance(balance);
        }
        Ok(result.with_raw(body))
    }
}

impl Default for CustomAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VendorAdapter for CustomAdapter {
    fn kind(&self) -> VendorKind {
        VendorKind::Custom
    }

    async fn balance(&self, ctx: &VendorContext) -> Result<VendorResult, VendorError> {
        let url = ctx.endpoint_url(VendorOperation::WalletBalance)?;
        let body = send_json(
            &ctx.provider_name,
            self.post(ctx, &url).json(&json!({})),
            ctx.timeout,
        )
        .await?;
        Self::parse(&ctx.provider_name, VendorOperation::WalletBalance, body)
    }

    async fn purchase(
        &self,
        ctx: &VendorContext,
        service: ServiceCategory,
        request_id: &str,
        payload: &VendorPayload,
    ) -> Result<VendorResult, VendorError> {
        let operation = service.purchase_operation();
        let url = ctx.endpoint_url(operation)?;
        let body = json!({
            "requestId": request_id,
            "service": service,
            "payload": payload,
        });
        let body = send_json(
            &ctx.provider_name,
            self.post(ctx, &url).json(&body),
            ctx.timeout,
        )
        .await?;
        Self::parse(&ctx.provider_name, operation, body)
    }

    async fn query(
        &self,
        ctx: &VendorContext,
        request_id: &str,
    ) -> Result<VendorResult, VendorError> {
        let url = ctx.endpoint_url(VendorOperation::QueryTransaction)?;
        let body = send_json(
            &ctx.provider_name,
            self.post(ctx, &url).json(&json!({ "requestId": request_id })),
            ctx.timeout,
        )
        .await?;
        Self::parse(&ctx.provider_name, VendorOperation::QueryTransaction, body)
    }

    async fn list_plans(
        &self,
        ctx: &VendorContext,
        payload: &VendorPayload,
    ) -> Result<VendorResult, VendorError> {
        let url = ctx.endpoint_url(VendorOperation::ListPlans)?;
        let body = send_json(
            &ctx.provider_name,
            self.post(ctx, &url).json(payload),
            ctx.timeout,
        )
        .await?;
        Ok(
            VendorResult::new(VendorOperation::ListPlans, TransactionStatus::Delivered)
                .with_raw(body),
        )
    }
}
