//! Shared fixtures for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use billpay_vendors::{
    RateLimitPolicy, ServiceCategory, TransactionStatus, VendorAdapter, VendorContext,
    VendorCredentials, VendorError, VendorKind, VendorOperation, VendorPayload, VendorResult,
};
use chrono::Utc;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::health::HealthSnapshot;
use crate::providers::Provider;

/// A custom-kind provider with every endpoint configured.
pub fn provider_fixture(name: &str, services: &[ServiceCategory]) -> Provider {
    let endpoints: BTreeMap<VendorOperation, String> = VendorOperation::ALL
        .iter()
        .map(|op| (*op, format!("/{}", op)))
        .collect();
    let now = Utc::now().naive_utc();
    Provider {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        display_name: name.to_uppercase(),
        description: None,
        vendor_kind: VendorKind::Custom,
        credentials: VendorCredentials {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        },
        base_url: "https://vendor.test".to_string(),
        endpoints,
        supported_services: services.to_vec(),
        is_active: false,
        is_default: false,
        rate_limit: RateLimitPolicy {
            requests_per_minute: 100,
            requests_per_hour: 1000,
        },
        health: HealthSnapshot::default(),
        removed_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// How the mock answers purchases and balance calls.
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    Deliver,
    Pending,
    /// Vendor answers with a rejection.
    Reject,
    /// Vendor-side timeout surfaced by the adapter.
    Timeout,
    /// Gateway in front of the vendor answers 5xx.
    GatewayError(u16),
    /// Sleep before answering, to trip the caller's timeout.
    Hang(Duration),
}

/// Adapter that records every operation it receives.
pub struct MockAdapter {
    kind: VendorKind,
    behavior: Mutex<MockBehavior>,
    query_status: Mutex<TransactionStatus>,
    log: Mutex<Vec<VendorOperation>>,
}

impl MockAdapter {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            kind: VendorKind::Custom,
            behavior: Mutex::new(behavior),
            query_status: Mutex::new(TransactionStatus::Delivered),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn set_query_status(&self, status: TransactionStatus) {
        *self.query_status.lock().unwrap() = status;
    }

    pub fn log(&self) -> Vec<VendorOperation> {
        self.log.lock().unwrap().clone()
    }

    pub fn calls(&self, operation: VendorOperation) -> usize {
        self.log().iter().filter(|op| **op == operation).count()
    }

    async fn answer(
        &self,
        ctx: &VendorContext,
        operation: VendorOperation,
    ) -> Result<VendorResult, VendorError> {
        self.log.lock().unwrap().push(operation);
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            MockBehavior::Deliver => Ok(VendorResult::new(operation, TransactionStatus::Delivered)
                .with_reference(format!("ref-{}", operation))
                .with_balance(dec!(25000))),
            MockBehavior::Pending => Ok(VendorResult::new(operation, TransactionStatus::Pending)),
            MockBehavior::Reject => Err(VendorError::ProviderError {
                provider: ctx.provider_name.clone(),
                message: "declined".to_string(),
            }),
            MockBehavior::Timeout => Err(VendorError::Timeout {
                provider: ctx.provider_name.clone(),
            }),
            MockBehavior::GatewayError(status) => Err(VendorError::ServerError {
                provider: ctx.provider_name.clone(),
                status,
                message: "bad gateway".to_string(),
            }),
            MockBehavior::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(VendorResult::new(operation, TransactionStatus::Delivered))
            }
        }
    }
}

#[async_trait]
impl VendorAdapter for MockAdapter {
    fn kind(&self) -> VendorKind {
        self.kind
    }

    async fn balance(&self, ctx: &VendorContext) -> Result<VendorResult, VendorError> {
        self.answer(ctx, VendorOperation::WalletBalance).await
    }

    async fn purchase(
        &self,
        ctx: &VendorContext,
        service: ServiceCategory,
        _request_id: &str,
        _payload: &VendorPayload,
    ) -> Result<VendorResult, VendorError> {
        self.answer(ctx, service.purchase_operation()).await
    }

    async fn query(
        &self,
        _ctx: &VendorContext,
        _request_id: &str,
    ) -> Result<VendorResult, VendorError> {
        self.log
            .lock()
            .unwrap()
            .push(VendorOperation::QueryTransaction);
        let status = *self.query_status.lock().unwrap();
        Ok(VendorResult::new(VendorOperation::QueryTransaction, status)
            .with_reference("ref-requery"))
    }
}
