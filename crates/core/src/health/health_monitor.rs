use std::sync::Arc;
use std::time::Instant;

use billpay_vendors::{CallOutcome, HealthWindow, RateLimiter, VendorAdapters, VendorError};
use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::Mutex;

use super::health_model::{HealthConfig, HealthProbeResult, HealthSnapshot};
use crate::errors::Result;
use crate::providers::{Provider, ProviderRepositoryTrait};

/// Rolling window plus the lifetime counter for one provider.
struct ProviderHealth {
    window: HealthWindow,
    total_requests: u64,
    /// The lifetime counter has been seeded from the stored snapshot.
    seeded: bool,
}

/// Keeps each provider's health snapshot current from probes and from the
/// outcomes of real calls.
///
/// Each provider has its own async mutex held across the window update and
/// the snapshot write, so concurrent `record` calls are applied one at a
/// time in the order they acquire the lock (completion order) and none is
/// lost.
pub struct HealthMonitor {
    repository: Arc<dyn ProviderRepositoryTrait>,
    adapters: VendorAdapters,
    rate_limiter: Arc<RateLimiter>,
    windows: DashMap<String, Arc<Mutex<ProviderHealth>>>,
    config: HealthConfig,
}

impl HealthMonitor {
    pub fn new(
        repository: Arc<dyn ProviderRepositoryTrait>,
        adapters: VendorAdapters,
        rate_limiter: Arc<RateLimiter>,
        config: HealthConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            repository,
            adapters,
            rate_limiter,
            windows: DashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    fn slot(&self, provider_id: &str) -> Arc<Mutex<ProviderHealth>> {
        self.windows
            .entry(provider_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(ProviderHealth {
                    window: HealthWindow::new(self.config.window_size),
                    total_requests: 0,
                    seeded: false,
                }))
            })
            .clone()
    }

    /// Fold one outcome into the provider's window and persist the
    /// resulting snapshot.
    pub async fn record(
        &self,
        provider_id: &str,
        success: bool,
        latency_ms: u64,
    ) -> Result<HealthSnapshot> {
        let slot = self.slot(provider_id);
        let mut health = slot.lock().await;

        if !health.seeded {
            let stored = self.repository.get_by_id(provider_id)?;
            health.total_requests = stored.health.total_requests;
            health.seeded = true;
        }

        health.window.push(CallOutcome {
            success,
            latency_ms,
        });
        health.total_requests += 1;

        let snapshot = HealthSnapshot::from_window(
            &health.window,
            &self.config.thresholds(),
            health.total_requests,
            Utc::now().naive_utc(),
        );
        self.repository
            .update_health(provider_id, snapshot.clone())
            .await?;

        debug!(
            "Health for {}: {} ({:.1}% over {}, {} in a row failed)",
            provider_id,
            snapshot.status,
            snapshot.success_rate,
            health.window.len(),
            snapshot.consecutive_failures
        );
        Ok(snapshot)
    }

    /// Test connectivity with a wallet-balance call.
    ///
    /// Never fails: every problem is reported in the returned result.
    /// Calls refused locally (unknown provider, rate limit, configuration)
    /// are not recorded into health.
    pub async fn probe(&self, provider_id: &str) -> HealthProbeResult {
        let checked_at = Utc::now().naive_utc();
        let failed = |message: String| HealthProbeResult {
            provider_id: provider_id.to_string(),
            success: false,
            latency_ms: 0,
            balance: None,
            message: Some(message),
            status: None,
            checked_at,
        };

        let provider = match self.repository.get_by_id(provider_id) {
            Ok(p) if !p.is_removed() => p,
            Ok(_) => return failed("provider has been removed".to_string()),
            Err(e) => return failed(e.to_string()),
        };
        self.probe_provider(&provider).await.unwrap_or_else(failed)
    }

    async fn probe_provider(
        &self,
        provider: &Provider,
    ) -> std::result::Result<HealthProbeResult, String> {
        let provider_key = std::borrow::Cow::Owned(provider.id.clone());
        if let Err(rejection) = self
            .rate_limiter
            .try_acquire(&provider_key, &provider.rate_limit)
        {
            return Err(format!(
                "rate limit reached (per {}), retry in {}s",
                rejection.window,
                rejection.retry_after.as_secs()
            ));
        }
        let adapter = self
            .adapters
            .get(provider.vendor_kind)
            .ok_or_else(|| format!("no adapter for {}", provider.vendor_kind))?;

        let ctx = provider.vendor_context(self.config.probe_timeout);
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.config.probe_timeout, adapter.balance(&ctx))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(VendorError::Timeout {
                provider: provider.name.clone(),
            }),
        };
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (success, balance, message) = match outcome {
            Ok(result) => (true, result.balance, result.message),
            Err(e) if !e.counts_against_health() => return Err(e.to_string()),
            Err(e) => (false, None, Some(e.to_string())),
        };

        let status = match self.record(&provider.id, success, latency_ms).await {
            Ok(snapshot) => Some(snapshot.status),
            Err(e) => {
                warn!("Failed to record probe for {}: {}", provider.name, e);
                None
            }
        };
        if !success {
            info!(
                "Probe of {} failed after {}ms: {}",
                provider.name,
                latency_ms,
                message.as_deref().unwrap_or("")
            );
        }

        Ok(HealthProbeResult {
            provider_id: provider.id.clone(),
            success,
            latency_ms,
            balance,
            message,
            status,
            checked_at: Utc::now().naive_utc(),
        })
    }

    /// Probe every provider that has not been removed, concurrently.
    pub async fn probe_all(&self) -> Vec<HealthProbeResult> {
        let providers = match self.repository.list() {
            Ok(providers) => providers,
            Err(e) => {
                warn!("Cannot list providers for probing: {}", e);
                return Vec::new();
            }
        };
        let probes = providers
            .iter()
            .filter(|p| !p.is_removed())
            .map(|p| self.probe(&p.id));
        join_all(probes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InMemoryProviderRepository;
    use crate::testing::{provider_fixture, MockAdapter, MockBehavior};
    use billpay_vendors::{HealthStatus, RateLimitPolicy, ServiceCategory, VendorOperation};
    use std::time::Duration;

    async fn setup(
        behavior: MockBehavior,
    ) -> (HealthMonitor, Arc<InMemoryProviderRepository>, Arc<MockAdapter>, String) {
        let repository = Arc::new(InMemoryProviderRepository::new());
        let provider = provider_fixture("vendor-a", &[ServiceCategory::Data]);
        let id = provider.id.clone();
        repository.create(provider).await.unwrap();

        let adapter = Arc::new(MockAdapter::new(behavior));
        let mut adapters = VendorAdapters::new();
        adapters.insert(adapter.clone());

        let config = HealthConfig {
            probe_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let monitor = HealthMonitor::new(
            repository.clone(),
            adapters,
            Arc::new(RateLimiter::new()),
            config,
        )
        .unwrap();
        (monitor, repository, adapter, id)
    }

    #[tokio::test]
    async fn test_three_failures_mark_down() {
        let (monitor, repository, _, id) = setup(MockBehavior::Deliver).await;
        for _ in 0..50 {
            monitor.record(&id, true, 100).await.unwrap();
        }
        for _ in 0..3 {
            monitor.record(&id, false, 100).await.unwrap();
        }
        let provider = repository.get_by_id(&id).unwrap();
        assert_eq!(provider.health.status, HealthStatus::Down);
        assert_eq!(provider.health.total_requests, 53);
        assert_eq!(provider.health.consecutive_failures, 3);
    }

    #[tokio::test]
    async fn test_total_requests_seeded_from_store() {
        let (monitor, repository, _, id) = setup(MockBehavior::Deliver).await;
        let mut seeded = HealthSnapshot::default();
        seeded.total_requests = 1000;
        repository.update_health(&id, seeded).await.unwrap();

        let snapshot = monitor.record(&id, true, 120).await.unwrap();
        assert_eq!(snapshot.total_requests, 1001);
    }

    #[tokio::test]
    async fn test_concurrent_records_are_not_lost() {
        let (monitor, repository, _, id) = setup(MockBehavior::Deliver).await;
        let monitor = Arc::new(monitor);
        let tasks: Vec<_> = (0..40)
            .map(|i| {
                let monitor = monitor.clone();
                let id = id.clone();
                tokio::spawn(async move { monitor.record(&id, i % 4 != 0, 10).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        let provider = repository.get_by_id(&id).unwrap();
        assert_eq!(provider.health.total_requests, 40);
        assert_eq!(provider.health.success_rate, 75.0);
    }

    #[tokio::test]
    async fn test_probe_success_reports_balance() {
        let (monitor, _, adapter, id) = setup(MockBehavior::Deliver).await;
        let result = monitor.probe(&id).await;
        assert!(result.success);
        assert!(result.balance.is_some());
        assert_eq!(result.status, Some(HealthStatus::Healthy));
        assert_eq!(adapter.calls(VendorOperation::WalletBalance), 1);
    }

    #[tokio::test]
    async fn test_probe_timeout_is_a_failure_not_an_error() {
        let (monitor, repository, _, id) =
            setup(MockBehavior::Hang(Duration::from_millis(500))).await;
        let result = monitor.probe(&id).await;
        assert!(!result.success);
        assert!(result.message.unwrap().contains("Timeout"));
        assert_eq!(repository.get_by_id(&id).unwrap().health.total_requests, 1);
    }

    #[tokio::test]
    async fn test_probe_unknown_provider() {
        let (monitor, _, _, _) = setup(MockBehavior::Deliver).await;
        let result = monitor.probe("missing").await;
        assert!(!result.success);
        assert_eq!(result.status, None);
    }

    #[tokio::test]
    async fn test_rate_limited_probe_leaves_health_untouched() {
        let (monitor, repository, adapter, id) = setup(MockBehavior::Deliver).await;
        let mut provider = repository.get_by_id(&id).unwrap();
        provider.rate_limit = RateLimitPolicy {
            requests_per_minute: 1,
            requests_per_hour: 10,
        };
        repository
            .update(provider, Default::default())
            .await
            .unwrap();

        assert!(monitor.probe(&id).await.success);
        let second = monitor.probe(&id).await;
        assert!(!second.success);
        assert_eq!(second.status, None);
        assert_eq!(adapter.calls(VendorOperation::WalletBalance), 1);
        assert_eq!(repository.get_by_id(&id).unwrap().health.total_requests, 1);
    }

    #[tokio::test]
    async fn test_probe_all_skips_removed() {
        let (monitor, repository, adapter, id) = setup(MockBehavior::Deliver).await;
        let other = provider_fixture("vendor-b", &[ServiceCategory::Data]);
        let other_id = other.id.clone();
        repository.create(other).await.unwrap();
        repository
            .soft_delete(&other_id, Utc::now().naive_utc())
            .await
            .unwrap();

        let results = monitor.probe_all().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].provider_id, id);
        assert_eq!(adapter.calls(VendorOperation::WalletBalance), 1);
    }
}
