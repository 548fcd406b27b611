//! Clubkonnect (Nellobytes) adapter.
//!
//! Every Clubkonnect API is a GET against an `.asp` endpoint with the
//! credentials (`UserID`, `APIKey`) in the query string. Orders answer with
//! `{orderid, statuscode, status}`; `status` is the authoritative field
//! (`ORDER_RECEIVED`, `ORDER_COMPLETED`, `ORDER_CANCELLED`, ...). Error
//! answers carry only a `status` such as `INVALID_CREDENTIALS`.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use super::http::{build_client, decimal_field, send_json, string_field};
use super::{VendorAdapter, VendorContext, VendorKind};
use crate::errors::VendorError;
use crate::models::{
    ServiceCategory, TransactionStatus, VendorOperation, VendorPayload, VendorResult,
};

pub struct ClubKonnectAdapter {
    client: Client,
}

impl ClubKonnectAdapter {
    pub fn new() -> Self {
        Self {
            client: build_client(),
        }
    }

    /// Clubkonnect's numeric network codes.
    fn network_code(network: &str) -> Option<&'static str> {
        match network.trim().to_ascii_lowercase().as_str() {
            "mtn" => Some("01"),
            "glo" => Some("02"),
            "9mobile" | "etisalat" => Some("03"),
            "airtel" => Some("04"),
            _ => None,
        }
    }

    /// Clubkonnect's electricity company codes.
    fn disco_code(disco: &str) -> Option<&'static str> {
        let disco = disco.trim().to_ascii_lowercase();
        let disco = disco.trim_end_matches("-electric");
        match disco {
            "eko" => Some("01"),
            "ikeja" => Some("02"),
            "abuja" => Some("03"),
            "kano" => Some("04"),
            "portharcourt" => Some("05"),
            "jos" => Some("06"),
            "ibadan" => Some("07"),
            "kaduna" => Some("08"),
            "enugu" => Some("09"),
            "benin" => Some("10"),
            "yola" => Some("11"),
            _ => None,
        }
    }

    fn meter_type_code(meter_type: &str) -> &'static str {
        if meter_type.eq_ignore_ascii_case("postpaid") || meter_type == "02" {
            "02"
        } else {
            "01"
        }
    }

    /// Build the query parameters for an order.
    fn order_params(
        ctx: &VendorContext,
        service: ServiceCategory,
        request_id: &str,
        payload: &VendorPayload,
    ) -> Result<Vec<(String, String)>, VendorError> {
        let key = payload
            .require_service_key()
            .map_err(|m| ctx.invalid_request(m))?;
        let recipient = payload
            .require_recipient()
            .map_err(|m| ctx.invalid_request(m))?;
        let variation = || {
            payload
                .variation_code
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ctx.invalid_request("variationCode is required"))
        };

        let mut params = vec![("RequestID".to_string(), request_id.to_string())];
        match service {
            ServiceCategory::Airtime => {
                let network = Self::network_code(key)
                    .ok_or_else(|| ctx.invalid_request(format!("unknown network '{}'", key)))?;
                let amount = payload.require_amount().map_err(|m| ctx.invalid_request(m))?;
                params.push(("MobileNetwork".to_string(), network.to_string()));
                params.push(("Amount".to_string(), amount.to_string()));
                params.push(("MobileNumber".to_string(), recipient.to_string()));
            }
            ServiceCategory::Data => {
                let network = Self::network_code(key)
                    .ok_or_else(|| ctx.invalid_request(format!("unknown network '{}'", key)))?;
                params.push(("MobileNetwork".to_string(), network.to_string()));
                params.push(("DataPlan".to_string(), variation()?));
                params.push(("MobileNumber".to_string(), recipient.to_string()));
            }
            ServiceCategory::Cable => {
                params.push(("CableTV".to_string(), key.to_ascii_lowercase()));
                params.push(("Package".to_string(), variation()?));
                params.push(("SmartCardNo".to_string(), recipient.to_string()));
            }
            ServiceCategory::Electricity => {
                let disco = Self::disco_code(key)
                    .ok_or_else(|| ctx.invalid_request(format!("unknown disco '{}'", key)))?;
                let amount = payload.require_amount().map_err(|m| ctx.invalid_request(m))?;
                let meter_type = Self::meter_type_code(&variation()?);
                params.push(("ElectricCompany".to_string(), disco.to_string()));
                params.push(("MeterType".to_string(), meter_type.to_string()));
                params.push(("MeterNo".to_string(), recipient.to_string()));
                params.push(("Amount".to_string(), amount.to_string()));
            }
        }
        if let Some(phone) = payload.phone.as_deref() {
            params.push(("PhoneNo".to_string(), phone.to_string()));
        }
        for (k, v) in &payload.extra {
            params.push((k.clone(), v.clone()));
        }
        Ok(params)
    }

    fn parse_order(
        provider: &str,
        operation: VendorOperation,
        body: Value,
    ) -> Result<VendorResult, VendorError> {
        let status = string_field(&body, "status")
            .unwrap_or_default()
            .to_ascii_uppercase();
        let order_status = match status.as_str() {
            "ORDER_COMPLETED" => TransactionStatus::Delivered,
            "ORDER_RECEIVED" | "ORDER_ONHOLD" | "ORDER_PROCESSING" => TransactionStatus::Pending,
            "ORDER_CANCELLED" | "ORDER_FAILED" | "ORDER_REVERSED" => TransactionStatus::Failed,
            "ORDER_NOT_FOUND" | "INVALID_REQUESTID" | "INVALID_ORDERID"
                if operation == VendorOperation::QueryTransaction =>
            {
                TransactionStatus::NotFound
            }
            "" => {
                return Err(VendorError::InvalidResponse {
                    provider: provider.to_string(),
                    message: "missing status".to_string(),
                })
            }
            other => {
                return Err(VendorError::ProviderError {
                    provider: provider.to_string(),
                    message: other.to_string(),
                })
            }
        };

        let mut result = VendorResult::new(operation, order_status).with_message(status.clone());
        if let Some(order_id) = string_field(&body, "orderid") {
            result = result.with_reference(order_id);
        }
        Ok(result.with_raw(body))
    }

    fn parse_balance(provider: &str, body: Value) -> Result<VendorResult, VendorError> {
        if let Some(balance) = decimal_field(&body, "balance") {
            return Ok(VendorResult::new(
                VendorOperation::WalletBalance,
                TransactionStatus::Delivered,
            )
            .with_balance(balance)
            .with_raw(body));
        }
        Err(VendorError::ProviderError {
            provider: provider.to_string(),
            message: string_field(&body, "status")
                .unwrap_or_else(|| "missing balance".to_string()),
        })
    }

    fn credential_params(ctx: &VendorContext) -> [(String, String); 2] {
        [
            ("UserID".to_string(), ctx.credentials.user_id().to_string()),
            ("APIKey".to_string(), ctx.credentials.api_key().to_string()),
        ]
    }
}

impl Default for ClubKonnectAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VendorAdapter for ClubKonnectAdapter {
    fn kind(&self) -> VendorKind {
        VendorKind::ClubKonnect
    }

    async fn balance(&self, ctx: &VendorContext) -> Result<VendorResult, VendorError> {
        let url = ctx.endpoint_url(VendorOperation::WalletBalance)?;
        let request = self.client.get(&url).query(&Self::credential_params(ctx));
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
        let params = Self::order_params(ctx, service, request_id, payload)?;
        debug!(
            "Clubkonnect {} for request {} via {}",
            operation, request_id, ctx.provider_name
        );
        let request = self
            .client
            .get(&url)
            .query(&Self::credential_params(ctx))
            .query(&params);
        let body = send_json(&ctx.provider_name, request, ctx.timeout).await?;
        Self::parse_order(&ctx.provider_name, operation, body)
    }

    async fn query(
        &self,
        ctx: &VendorContext,
        request_id: &str,
    ) -> Result<VendorResult, VendorError> {
        let url = ctx.endpoint_url(VendorOperation::QueryTransaction)?;
        let request = self
            .client
            .get(&url)
            .query(&Self::credential_params(ctx))
            .query(&[("RequestID", request_id)]);
        let body = send_json(&ctx.provider_name, request, ctx.timeout).await?;
        Self::parse_order(&ctx.provider_name, VendorOperation::QueryTransaction, body)
    }

    async fn list_plans(
        &self,
        ctx: &VendorContext,
        _payload: &VendorPayload,
    ) -> Result<VendorResult, VendorError> {
        let url = ctx.endpoint_url(VendorOperation::ListPlans)?;
        let request = self
            .client
            .get(&url)
            .query(&[("UserID", ctx.credentials.user_id())]);
        let body = send_json(&ctx.provider_name, request, ctx.timeout).await?;
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
    use serde_json::json;
    use std::borrow::Cow;
    use std::time::Duration;

    fn ctx() -> VendorContext {
        VendorContext {
            provider_id: Cow::Borrowed("p-ck"),
            provider_name: "clubkonnect".to_string(),
            base_url: "https://www.nellobytesystems.com".to_string(),
            endpoints: VendorKind::ClubKonnect.default_endpoints(),
            credentials: VendorCredentials {
                user_id: Some("CK100".to_string()),
                api_key: Some("key".to_string()),
                ..Default::default()
            },
            timeout: Duration::from_secs(10),
        }
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_airtime_params() {
        let payload = VendorPayload {
            service_key: Some("airtel".to_string()),
            recipient: Some("08022222222".to_string()),
            amount: Some(dec!(500)),
            ..Default::default()
        };
        let params =
            ClubKonnectAdapter::order_params(&ctx(), ServiceCategory::Airtime, "req-9", &payload)
                .unwrap();
        assert_eq!(param(&params, "MobileNetwork"), Some("04"));
        assert_eq!(param(&params, "Amount"), Some("500"));
        assert_eq!(param(&params, "RequestID"), Some("req-9"));
    }

    #[test]
    fn test_electricity_params_map_disco_and_meter_type() {
        let payload = VendorPayload {
            service_key: Some("ikeja-electric".to_string()),
            recipient: Some("45012345678".to_string()),
            amount: Some(dec!(3000)),
            variation_code: Some("postpaid".to_string()),
            ..Default::default()
        };
        let params = ClubKonnectAdapter::order_params(
            &ctx(),
            ServiceCategory::Electricity,
            "req-10",
            &payload,
        )
        .unwrap();
        assert_eq!(param(&params, "ElectricCompany"), Some("02"));
        assert_eq!(param(&params, "MeterType"), Some("02"));
        assert_eq!(param(&params, "MeterNo"), Some("45012345678"));
    }

    #[test]
    fn test_unknown_network_rejected_locally() {
        let payload = VendorPayload {
            service_key: Some("ntel".to_string()),
            recipient: Some("0801".to_string()),
            amount: Some(dec!(100)),
            ..Default::default()
        };
        let err =
            ClubKonnectAdapter::order_params(&ctx(), ServiceCategory::Airtime, "r", &payload)
                .unwrap_err();
        assert!(matches!(err, VendorError::InvalidRequest { .. }));
    }

    #[test]
    fn test_parse_order_statuses() {
        let received = json!({"orderid": "789", "statuscode": "100", "status": "ORDER_RECEIVED"});
        let result =
            ClubKonnectAdapter::parse_order("clubkonnect", VendorOperation::DataPurchase, received)
                .unwrap();
        assert_eq!(result.status, TransactionStatus::Pending);
        assert_eq!(result.vendor_reference.as_deref(), Some("789"));

        let completed = json!({"orderid": "789", "statuscode": "200", "status": "ORDER_COMPLETED"});
        let result = ClubKonnectAdapter::parse_order(
            "clubkonnect",
            VendorOperation::QueryTransaction,
            completed,
        )
        .unwrap();
        assert_eq!(result.status, TransactionStatus::Delivered);
    }

    #[test]
    fn test_parse_order_errors() {
        let body = json!({"status": "INSUFFICIENT_BALANCE"});
        let err = ClubKonnectAdapter::parse_order("clubkonnect", VendorOperation::DataPurchase, body)
            .unwrap_err();
        assert!(matches!(err, VendorError::ProviderError { .. }));

        let body = json!({"status": "ORDER_NOT_FOUND"});
        let result = ClubKonnectAdapter::parse_order(
            "clubkonnect",
            VendorOperation::QueryTransaction,
            body,
        )
        .unwrap();
        assert_eq!(result.status, TransactionStatus::NotFound);
    }

    #[test]
    fn test_parse_balance() {
        let body = json!({"date": "2026-10-19", "id": "CK100", "balance": "20500.00"});
        let result = ClubKonnectAdapter::parse_balance("clubkonnect", body).unwrap();
        assert_eq!(result.balance, Some(dec!(20500)));

        let body = json!({"status": "INVALID_CREDENTIALS"});
        let err = ClubKonnectAdapter::parse_balance("clubkonnect", body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider error: clubkonnect - INVALID_CREDENTIALS"
        );
    }
}
