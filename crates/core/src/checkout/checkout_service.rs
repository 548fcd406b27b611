use std::sync::Arc;

use log::info;

use super::checkout_model::{CheckoutRequest, CheckoutResult, ProviderUsed};
use crate::commission::CommissionServiceTrait;
use crate::errors::{Result, ValidationError};
use crate::execution::ExecutionService;
use crate::providers::ProviderRepositoryTrait;
use crate::routing::RoutingService;

/// Prices, routes and executes one purchase.
///
/// Failures are returned as they are; retrying (with the same idempotency
/// key) is the caller's decision.
pub struct CheckoutService {
    commission: Arc<dyn CommissionServiceTrait>,
    routing: Arc<RoutingService>,
    execution: Arc<ExecutionService>,
    providers: Arc<dyn ProviderRepositoryTrait>,
}

impl CheckoutService {
    pub fn new(
        commission: Arc<dyn CommissionServiceTrait>,
        routing: Arc<RoutingService>,
        execution: Arc<ExecutionService>,
        providers: Arc<dyn ProviderRepositoryTrait>,
    ) -> Self {
        Self {
            commission,
            routing,
            execution,
            providers,
        }
    }

    pub async fn purchase(&self, request: CheckoutRequest) -> Result<CheckoutResult> {
        if request.recipient.trim().is_empty() {
            return Err(ValidationError::MissingField("recipient".to_string()).into());
        }

        let quote = self
            .commission
            .price(request.service, request.key.as_deref(), request.amount)?;
        let decision = self.routing.route(request.service)?;
        let execution = self
            .execution
            .execute(
                &decision.provider,
                request.service.purchase_operation(),
                &request.payload(),
                Some(&request.idempotency_key),
            )
            .await?;

        // A requery or replay answers for the provider of the first dispatch.
        let provider_used = if execution.provider_id == decision.provider.id {
            ProviderUsed::from(&decision.provider)
        } else {
            ProviderUsed::from(&self.providers.get_by_id(&execution.provider_id)?)
        };

        info!(
            "Checkout '{}': {} {} charged {} via {} ({})",
            request.idempotency_key,
            request.service,
            quote.nominal_amount,
            quote.charged_amount,
            provider_used.name,
            decision.reason
        );
        Ok(CheckoutResult {
            charged_amount: quote.charged_amount,
            commission: quote.commission,
            provider_used,
            routing_reason: decision.reason,
            source: execution.source,
            vendor_result: execution.result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commission::{CommissionRateInput, CommissionService, InMemoryCommissionRepository};
    use crate::errors::Error;
    use crate::execution::{ExecutionConfig, ExecutionSource, InMemoryIdempotencyLedger};
    use crate::health::{HealthConfig, HealthMonitor};
    use crate::providers::{InMemoryProviderRepository, ProviderRepositoryTrait};
    use crate::routing::RoutingReason;
    use crate::testing::{provider_fixture, MockAdapter, MockBehavior};
    use billpay_vendors::{
        HealthStatus, RateLimiter, ServiceCategory, TransactionStatus, VendorAdapters,
        VendorOperation,
    };
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::time::Duration;

    struct Harness {
        checkout: CheckoutService,
        repository: Arc<InMemoryProviderRepository>,
        adapter: Arc<MockAdapter>,
        active_id: String,
        default_id: String,
    }

    async fn harness(behavior: MockBehavior) -> Harness {
        let repository = Arc::new(InMemoryProviderRepository::new());
        let mut active = provider_fixture("vendor-a", &[ServiceCategory::Electricity]);
        active.is_active = true;
        let mut default = provider_fixture("vendor-b", &[ServiceCategory::Electricity]);
        default.is_default = true;
        let active_id = repository.create(active).await.unwrap().id;
        let default_id = repository.create(default).await.unwrap().id;

        let adapter = Arc::new(MockAdapter::new(behavior));
        let mut adapters = VendorAdapters::new();
        adapters.insert(adapter.clone());
        let rate_limiter = Arc::new(RateLimiter::new());
        let health = Arc::new(
            HealthMonitor::new(
                repository.clone(),
                adapters.clone(),
                rate_limiter.clone(),
                HealthConfig::default(),
            )
            .unwrap(),
        );
        let execution = ExecutionService::new(
            repository.clone(),
            adapters,
            rate_limiter,
            health,
            Arc::new(InMemoryIdempotencyLedger::new()),
            ExecutionConfig {
                default_timeout: Duration::from_millis(50),
                ..Default::default()
            },
        )
        .unwrap();

        let commission = CommissionService::new(Arc::new(InMemoryCommissionRepository::new()));
        commission
            .set_global(
                ServiceCategory::Electricity,
                CommissionRateInput {
                    commission_rate: dec!(5),
                    min_amount: dec!(1000),
                    max_amount: dec!(50000),
                },
            )
            .await
            .unwrap();
        commission
            .set_override(
                ServiceCategory::Electricity,
                "ikeja",
                CommissionRateInput {
                    commission_rate: dec!(4),
                    min_amount: dec!(1000),
                    max_amount: dec!(50000),
                },
            )
            .await
            .unwrap();

        let checkout = CheckoutService::new(
            Arc::new(commission),
            Arc::new(RoutingService::new(repository.clone())),
            Arc::new(execution),
            repository.clone(),
        );
        Harness {
            checkout,
            repository,
            adapter,
            active_id,
            default_id,
        }
    }

    fn request(key: &str, amount: rust_decimal::Decimal, idempotency_key: &str) -> CheckoutRequest {
        CheckoutRequest {
            service: ServiceCategory::Electricity,
            key: Some(key.to_string()),
            amount,
            idempotency_key: idempotency_key.to_string(),
            recipient: "45031234567".to_string(),
            variation_code: Some("prepaid".to_string()),
            phone: Some("08030000000".to_string()),
            extra: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_purchase_prices_and_routes_to_active() {
        let h = harness(MockBehavior::Deliver).await;
        let result = h
            .checkout
            .purchase(request("ikeja", dec!(2000), "order-1"))
            .await
            .unwrap();

        assert_eq!(result.charged_amount, dec!(1920));
        assert_eq!(result.commission, dec!(80));
        assert_eq!(result.provider_used.id, h.active_id);
        assert_eq!(result.routing_reason, RoutingReason::Active);
        assert_eq!(result.vendor_result.status, TransactionStatus::Delivered);
        assert_eq!(h.adapter.calls(VendorOperation::ElectricityPurchase), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_never_reaches_vendor() {
        let h = harness(MockBehavior::Deliver).await;
        let err = h
            .checkout
            .purchase(request("eko", dec!(500), "order-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AmountOutOfRange { .. }));
        assert!(h.adapter.log().is_empty());
    }

    #[tokio::test]
    async fn test_all_down_is_reported_not_retried() {
        let h = harness(MockBehavior::Deliver).await;
        for id in [&h.active_id, &h.default_id] {
            let mut snapshot = h.repository.get_by_id(id).unwrap().health;
            snapshot.status = HealthStatus::Down;
            h.repository.update_health(id, snapshot).await.unwrap();
        }

        let err = h
            .checkout
            .purchase(request("eko", dec!(2000), "order-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoProviderAvailable { .. }));
        assert!(h.adapter.log().is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_failover_requeries_original_provider() {
        let h = harness(MockBehavior::Timeout).await;
        let err = h
            .checkout
            .purchase(request("eko", dec!(2000), "order-1"))
            .await
            .unwrap_err();
        assert!(err.is_vendor_timeout());

        // Active provider goes down; routing now prefers the default.
        let mut snapshot = h.repository.get_by_id(&h.active_id).unwrap().health;
        snapshot.status = HealthStatus::Down;
        h.repository
            .update_health(&h.active_id, snapshot)
            .await
            .unwrap();

        let result = h
            .checkout
            .purchase(request("eko", dec!(2000), "order-1"))
            .await
            .unwrap();
        assert_eq!(result.routing_reason, RoutingReason::Default);
        assert_eq!(result.source, ExecutionSource::Requeried);
        assert_eq!(result.provider_used.id, h.active_id);
        assert_eq!(h.adapter.calls(VendorOperation::ElectricityPurchase), 1);
        assert_eq!(h.adapter.calls(VendorOperation::QueryTransaction), 1);
    }
}
