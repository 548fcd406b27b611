//! VTPass adapter.
//!
//! VTPass exposes a single `/pay` endpoint for every service, keyed by a
//! `serviceID` such as `mtn`, `glo-data`, `ikeja-electric` or `dstv`.
//! Requests authenticate with `api-key` plus `secret-key` (POST) or
//! `public-key` (GET) headers. Responses carry a three-digit `code`;
//! `000` means the request was accepted and the transaction status lives
//! under `content.transactions.status`.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

use super::http::{build_client, decimal_field, send_json, string_field};
use super::{VendorAdapter, VendorContext, VendorKind};
use crate::errors::VendorError;
use crate::models::{
    ServiceCategory, TransactionStatus, VendorOperation, VendorPayload, VendorResult,
};

/// Request accepted; see `content.transactions.status`.
const CODE_OK: &str = "000";
/// Transaction is still processing.
const CODE_PROCESSING: &str = "099";
/// Unknown request id on requery.
const CODE_INVALID_REQUEST_ID: &str = "015";
/// Transaction failed at the biller.
const CODE_TRANSACTION_FAILED: &str = "016";
/// Transaction was reversed.
const CODE_REVERSED: &str = "040";

pub struct VtPassAdapter {
    client: Client,
}

impl VtPassAdapter {
    pub fn new() -> Self {
        Self {
            client: build_client(),
        }
    }

    /// Map the uniform service key to VTPass's `serviceID`.
    fn service_id(service: ServiceCategory, key: &str) -> String {
        let key = key.trim().to_ascii_lowercase();
        let network = if key == "9mobile" { "etisalat" } else { key.as_str() };
        match service {
            ServiceCategory::Airtime => network.to_string(),
            ServiceCategory::Data => {
                if network.ends_with("-data") {
                    network.to_string()
                } else {
                    format!("{}-data", network)
                }
            }
            ServiceCategory::Electricity => {
                if key.ends_with("-electric") {
                    key
                } else {
                    format!("{}-electric", key)
                }
            }
            ServiceCategory::Cable => key,
        }
    }

    fn pay_body(
        ctx: &VendorContext,
        service: ServiceCategory,
        request_id: &str,
        payload: &VendorPayload,
    ) -> Result<Value, VendorError> {
        let key = payload
            .require_service_key()
            .map_err(|m| ctx.invalid_request(m))?;
        let recipient = payload
            .require_recipient()
            .map_err(|m| ctx.invalid_request(m))?;

        let mut body = json!({
            "request_id": request_id,
            "serviceID": Self::service_id(service, key),
            "billersCode": recipient,
            "phone": payload.phone.as_deref().unwrap_or(recipient),
        });

        match service {
            ServiceCategory::Airtime | ServiceCategory::Electricity => {
                let amount = payload.require_amount().map_err(|m| ctx.invalid_request(m))?;
                body["amount"] = json!(amount.to_string());
            }
            ServiceCategory::Data | ServiceCategory::Cable => {
                if let Some(amount) = payload.amount {
                    body["amount"] = json!(amount.to_string());
                }
            }
        }

        match service {
            ServiceCategory::Data | ServiceCategory::Cable | ServiceCategory::Electricity => {
                let variation = payload
                    .variation_code
                    .as_deref()
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| ctx.invalid_request("variationCode is required"))?;
                body["variation_code"] = json!(variation);
            }
            ServiceCategory::Airtime => {}
        }

        for (k, v) in &payload.extra {
            body[k.as_str()] = json!(v);
        }
        Ok(body)
    }

    /// Interpret a `/pay` or `/requery` response body.
    fn parse_transaction(
        provider: &str,
        operation: VendorOperation,
        body: Value,
    ) -> Result<VendorResult, VendorError> {
        let code = string_field(&body, "code").unwrap_or_default();
        let description = string_field(&body, "response_description").unwrap_or_default();

        let status = match code.as_str() {
            CODE_OK => {
                let tx = body
                    .get("content")
                    .and_then(|c| c.get("transactions"))
                    .cloned()
                    .unwrap_or(Value::Null);
                let status = string_field(&tx, "status").unwrap_or_default();
                let status = match status.to_ascii_lowercase().as_str() {
                    "delivered" | "successful" => TransactionStatus::Delivered,
                    "pending" | "initiated" => TransactionStatus::Pending,
                    "failed" | "reversed" => TransactionStatus::Failed,
                    other => {
                        return Err(VendorError::InvalidResponse {
                            provider: provider.to_string(),
                            message: format!("unknown transaction status '{}'", other),
                        })
                    }
                };
                let mut result = VendorResult::new(operation, status).with_message(description);
                if let Some(reference) = string_field(&tx, "transactionId") {
                    result = result.with_reference(reference);
                }
                return Ok(result.with_raw(body));
            }
            CODE_PROCESSING => TransactionStatus::Pending,
            CODE_TRANSACTION_FAILED | CODE_REVERSED => TransactionStatus::Failed,
            CODE_INVALID_REQUEST_ID if operation == VendorOperation::QueryTransaction => {
                TransactionStatus::NotFound
            }
            _ => {
                return Err(VendorError::ProviderError {
                    provider: provider.to_string(),
                    message: format!("code {} - {}", code, description),
                })
            }
        };

        Ok(VendorResult::new(operation, status)
            .with_message(description)
            .with_raw(body))
    }

    fn parse_balance(provider: &str, body: Value) -> Result<VendorResult, VendorError> {
        let code = string_field(&body, "code").unwrap_or_default();
        if code != "1" {
            return Err(VendorError::ProviderError {
                provider: provider.to_string(),
                message: format!("balance query returned code {}", code),
            });
        }
        let balance = body
            .get("contents")
            .and_then(|c| decimal_field(c, "balance"))
            .ok_or_else(|| VendorError::InvalidResponse {
                provider: provider.to_string(),
                message: "missing contents.balance".to_string(),
            })?;
        Ok(
            VendorResult::new(VendorOperation::WalletBalance, TransactionStatus::Delivered)
                .with_balance(balance)
                .with_raw(body),
        )
    }
}

impl Default for VtPassAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VendorAdapter for VtPassAdapter {
    fn kind(&self) -> VendorKind {
        VendorKind::VtPass
    }

    async fn balance(&self, ctx: &VendorContext) -> Result<VendorResult, VendorError> {
        let url = ctx.endpoint_url(VendorOperation::WalletBalance)?;
        let request = self
            .client
            .get(&url)
            .header("api-key", ctx.credentials.api_key())
            .header("public-key", ctx.credentials.public_key());
        let body = send_json(&ctx.provider_name, request, ctx.timeout).await?;
        Self::parse_balance(&ctx.provider_name, body)
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
        let body = Self::pay_body(ctx, service, request_id, payload)?;
        debug!(
            "VTPass {} for request {} via {}",
            operation, request_id, ctx.provider_name
        );
        let request = self
            .client
            .post(&url)
            .header("api-key", ctx.credentials.api_key())
            .header("secret-key", ctx.credentials.secret_key())
            .json(&body);
        let response = send_json(&ctx.provider_name, request, ctx.timeout).await?;
        Self::parse_transaction(&ctx.provider_name, operation, response)
    }

    async fn query(
        &self,
        ctx: &VendorContext,
        request_id: &str,
    ) -> Result<VendorResult, VendorError> {
        let url = ctx.endpoint_url(VendorOperation::QueryTransaction)?;
        let request = self
            .client
            .post(&url)
            .header("api-key", ctx.credentials.api_key())
            .header("secret-key", ctx.credentials.secret_key())
            .json(&json!({ "request_id": request_id }));
        let response = send_json(&ctx.provider_name, request, ctx.timeout).await?;
        Self::parse_transaction(
            &ctx.provider_name,
            VendorOperation::QueryTransaction,
            response,
        )
    }

    async fn list_plans(
        &self,
        ctx: &VendorContext,
        payload: &VendorPayload,
    ) -> Result<VendorResult, VendorError> {
        let url = ctx.endpoint_url(VendorOperation::ListPlans)?;
        let service_id = payload
            .require_service_key()
            .map_err(|m| ctx.invalid_request(m))?;
        let request = self
            .client
            .get(&url)
            .query(&[("serviceID", service_id)])
            .header("api-key", ctx.credentials.api_key())
            .header("public-key", ctx.credentials.public_key());
        let body = send_json(&ctx.provider_name, request, ctx.timeout).await?;
        let code = string_field(&body, "response_description").unwrap_or_default();
        if code != CODE_OK {
            return Err(VendorError::ProviderError {
                provider: ctx.provider_name.clone(),
                message: format!("service-variations returned {}", code),
            });
        }
        Ok(
            VendorResult::new(VendorOperation::ListPlans, TransactionStatus::Delivered)
                .with_raw(body),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VendorCredentials;
    use rust_decimal_macros::dec;
    use std::borrow::Cow;
    use std::time::Duration;

    fn ctx() -> VendorContext {
        VendorContext {
            provider_id: Cow::Borrowed("p-vtpass"),
            provider_name: "vtpass".to_string(),
            base_url: "https://sandbox.vtpass.com/api".to_string(),
            endpoints: VendorKind::VtPass.default_endpoints(),
            credentials: VendorCredentials::default(),
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_service_id_mapping() {
        assert_eq!(VtPassAdapter::service_id(ServiceCategory::Airtime, "MTN"), "mtn");
        assert_eq!(
            VtPassAdapter::service_id(ServiceCategory::Airtime, "9mobile"),
            "etisalat"
        );
        assert_eq!(
            VtPassAdapter::service_id(ServiceCategory::Data, "glo"),
            "glo-data"
        );
        assert_eq!(
            VtPassAdapter::service_id(ServiceCategory::Electricity, "ikeja"),
            "ikeja-electric"
        );
        assert_eq!(
            VtPassAdapter::service_id(ServiceCategory::Electricity, "eko-electric"),
            "eko-electric"
        );
        assert_eq!(VtPassAdapter::service_id(ServiceCategory::Cable, "dstv"), "dstv");
    }

    #[test]
    fn test_pay_body_for_electricity() {
        let payload = VendorPayload {
            service_key: Some("ikeja".to_string()),
            recipient: Some("1111111111111".to_string()),
            amount: Some(dec!(2000)),
            variation_code: Some("prepaid".to_string()),
            phone: Some("08011111111".to_string()),
            ..Default::default()
        };
        let body =
            VtPassAdapter::pay_body(&ctx(), ServiceCategory::Electricity, "req-1", &payload)
                .unwrap();
        assert_eq!(body["serviceID"], "ikeja-electric");
        assert_eq!(body["billersCode"], "1111111111111");
        assert_eq!(body["variation_code"], "prepaid");
        assert_eq!(body["amount"], "2000");
        assert_eq!(body["phone"], "08011111111");
        assert_eq!(body["request_id"], "req-1");
    }

    #[test]
    fn test_pay_body_requires_variation_for_data() {
        let payload = VendorPayload {
            service_key: Some("mtn".to_string()),
            recipient: Some("08011111111".to_string()),
            ..Default::default()
        };
        let err = VtPassAdapter::pay_body(&ctx(), ServiceCategory::Data, "req-2", &payload)
            .unwrap_err();
        assert!(matches!(err, VendorError::InvalidRequest { .. }));
    }

    #[test]
    fn test_parse_delivered_transaction() {
        let body = json!({
            "code": "000",
            "response_description": "TRANSACTION SUCCESSFUL",
            "content": {"transactions": {"status": "delivered", "transactionId": "17415980564672211596768751"}}
        });
        let result =
            VtPassAdapter::parse_transaction("vtpass", VendorOperation::AirtimePurchase, body)
                .unwrap();
        assert_eq!(result.status, TransactionStatus::Delivered);
        assert_eq!(
            result.vendor_reference.as_deref(),
            Some("17415980564672211596768751")
        );
    }

    #[test]
    fn test_parse_processing_and_failed_codes() {
        let processing = json!({"code": "099", "response_description": "TRANSACTION IS PROCESSING"});
        let result = VtPassAdapter::parse_transaction(
            "vtpass",
            VendorOperation::DataPurchase,
            processing,
        )
        .unwrap();
        assert_eq!(result.status, TransactionStatus::Pending);

        let failed = json!({"code": "016", "response_description": "TRANSACTION FAILED"});
        let result =
            VtPassAdapter::parse_transaction("vtpass", VendorOperation::DataPurchase, failed)
                .unwrap();
        assert_eq!(result.status, TransactionStatus::Failed);
    }

    #[test]
    fn test_unknown_request_id_only_not_found_on_requery() {
        let body = json!({"code": "015", "response_description": "INVALID REQUEST ID"});
        let result = VtPassAdapter::parse_transaction(
            "vtpass",
            VendorOperation::QueryTransaction,
            body.clone(),
        )
        .unwrap();
        assert_eq!(result.status, TransactionStatus::NotFound);

        let err = VtPassAdapter::parse_transaction("vtpass", VendorOperation::DataPurchase, body)
            .unwrap_err();
        assert!(matches!(err, VendorError::ProviderError { .. }));
    }

    #[test]
    fn test_parse_balance() {
        let body = json!({"code": 1, "contents": {"balance": 15250.75}});
        let result = VtPassAdapter::parse_balance("vtpass", body).unwrap();
        assert_eq!(result.balance, Some(dec!(15250.75)));

        let body = json!({"code": 0});
        assert!(VtPassAdapter::parse_balance("vtpass", body).is_err());
    }
}
