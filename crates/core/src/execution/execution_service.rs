use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use billpay_vendors::{
    FailureClass, RateLimiter, TransactionStatus, VendorAdapters, VendorError, VendorOperation,
    VendorPayload, VendorResult,
};
use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::runtime::Handle;

use super::execution_model::{
    request_fingerprint, BeginOutcome, Execution, ExecutionConfig, ExecutionSource, LedgerEntry,
    LedgerState,
};
use super::execution_traits::IdempotencyLedgerTrait;
use crate::errors::{Error, Result, ValidationError};
use crate::health::HealthMonitor;
use crate::providers::{Provider, ProviderRepositoryTrait};

/// Marks a purchase `Unknown` if the dispatching future is dropped before
/// the vendor answers.
struct InFlightGuard {
    ledger: Arc<dyn IdempotencyLedgerTrait>,
    key: String,
    armed: bool,
}

impl InFlightGuard {
    fn new(ledger: Arc<dyn IdempotencyLedgerTrait>, key: &str) -> Self {
        Self {
            ledger,
            key: key.to_string(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let key = std::mem::take(&mut self.key);
        warn!("Purchase '{}' was cancelled after dispatch; outcome unknown", key);
        match Handle::try_current() {
            Ok(handle) => {
                let ledger = self.ledger.clone();
                handle.spawn(async move {
                    if let Err(e) = ledger.mark_unknown(&key).await {
                        error!("Failed to mark purchase '{}' unknown: {}", key, e);
                    }
                });
            }
            Err(_) => warn!(
                "No runtime to record cancelled purchase '{}'; it will be requeried once stale",
                key
            ),
        }
    }
}

/// Performs vendor calls under the provider's rate limit, reports every
/// outcome to the health monitor, and makes purchases idempotent.
///
/// Purchases require an idempotency key, forwarded to the vendor as its
/// request id. Re-executing a key whose outcome is unknown issues a status
/// query to the provider of the first dispatch instead of a second
/// purchase. Nothing here retries on its own.
pub struct ExecutionService {
    repository: Arc<dyn ProviderRepositoryTrait>,
    adapters: VendorAdapters,
    rate_limiter: Arc<RateLimiter>,
    health: Arc<HealthMonitor>,
    ledger: Arc<dyn IdempotencyLedgerTrait>,
    config: ExecutionConfig,
}

impl ExecutionService {
    pub fn new(
        repository: Arc<dyn ProviderRepositoryTrait>,
        adapters: VendorAdapters,
        rate_limiter: Arc<RateLimiter>,
        health: Arc<HealthMonitor>,
        ledger: Arc<dyn IdempotencyLedgerTrait>,
        config: ExecutionConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            repository,
            adapters,
            rate_limiter,
            health,
            ledger,
            config,
        })
    }

    /// Execute `operation` against `provider`.
    ///
    /// The provider record is re-read so credential changes and removals
    /// made since routing are honored.
    pub async fn execute(
        &self,
        provider: &Provider,
        operation: VendorOperation,
        payload: &VendorPayload,
        idempotency_key: Option<&str>,
    ) -> Result<Execution> {
        let provider = self.repository.get_by_id(&provider.id)?;
        if provider.is_removed() {
            return Err(Error::not_found(format!(
                "provider {} has been removed",
                provider.name
            )));
        }

        let Some(service) = operation.purchased_service() else {
            let result = self
                .call(&provider, operation, payload, idempotency_key)
                .await?;
            return Ok(Execution {
                provider_id: provider.id,
                result,
                source: ExecutionSource::Dispatched,
            });
        };

        if !provider.supports(service) {
            return Err(ValidationError::invalid(format!(
                "provider {} does not sell {}",
                provider.name, service
            ))
            .into());
        }
        let key = idempotency_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ValidationError::MissingField("idempotencyKey".to_string()))?;

        let fingerprint = request_fingerprint(operation, payload);
        match self
            .ledger
            .try_begin(key, &provider.id, operation, &fingerprint)
            .await?
        {
            BeginOutcome::Started => self.dispatch_purchase(&provider, operation, payload, key).await,
            BeginOutcome::Existing(entry) if entry.fingerprint != fingerprint => {
                warn!(
                    "Idempotency key '{}' reused for a different {} request",
                    key, operation
                );
                Err(Error::Conflict(format!(
                    "idempotency key '{}' was already used for a different request",
                    key
                )))
            }
            BeginOutcome::Existing(entry) => self.resume(entry).await,
        }
    }

    async fn dispatch_purchase(
        &self,
        provider: &Provider,
        operation: VendorOperation,
        payload: &VendorPayload,
        key: &str,
    ) -> Result<Execution> {
        let guard = InFlightGuard::new(self.ledger.clone(), key);
        let outcome = self.call(provider, operation, payload, Some(key)).await;
        guard.disarm();

        match outcome {
            Ok(result) => {
                if result.status == TransactionStatus::Pending {
                    self.settle(self.ledger.mark_unknown(key).await, key);
                } else {
                    self.settle(self.ledger.complete(key, &result).await, key);
                }
                info!(
                    "Purchase '{}' on {} returned {:?}",
                    key, provider.name, result.status
                );
                Ok(Execution {
                    provider_id: provider.id.clone(),
                    result,
                    source: ExecutionSource::Dispatched,
                })
            }
            Err(Error::Vendor(e)) => {
                if e.failure_class() == FailureClass::Unknown {
                    warn!(
                        "Purchase '{}' on {} has an unknown outcome: {}",
                        key, provider.name, e
                    );
                    self.settle(self.ledger.mark_unknown(key).await, key);
                } else {
                    self.settle(self.ledger.release(key).await, key);
                }
                Err(Error::Vendor(e))
            }
            Err(other) => {
                // Refused before reaching the vendor.
                self.settle(self.ledger.release(key).await, key);
                Err(other)
            }
        }
    }

    /// Continue a key seen before: replay, refuse, or requery.
    async fn resume(&self, entry: LedgerEntry) -> Result<Execution> {
        match entry.state {
            LedgerState::Completed => {
                let result = entry.result.ok_or_else(|| {
                    Error::Unexpected(format!("completed purchase '{}' has no result", entry.key))
                })?;
                debug!("Replaying stored result for '{}'", entry.key);
                return Ok(Execution {
                    provider_id: entry.provider_id,
                    result,
                    source: ExecutionSource::Replayed,
                });
            }
            LedgerState::InFlight => {
                let age = (Utc::now().naive_utc() - entry.updated_at)
                    .to_std()
                    .unwrap_or_default();
                if age < self.config.stale_in_flight_after {
                    return Err(Error::Conflict(format!(
                        "purchase '{}' is already in progress",
                        entry.key
                    )));
                }
                warn!("Purchase '{}' has been in flight for {:?}; requerying", entry.key, age);
            }
            LedgerState::Unknown => {}
        }

        let original = self.repository.get_by_id(&entry.provider_id)?;
        let key = entry.key.as_str();
        let outcome = self
            .call(
                &original,
                VendorOperation::QueryTransaction,
                &VendorPayload::default(),
                Some(key),
            )
            .await;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                if entry.state == LedgerState::InFlight {
                    self.settle(self.ledger.mark_unknown(key).await, key);
                }
                return Err(e);
            }
        };

        match result.status {
            TransactionStatus::Delivered | TransactionStatus::Failed => {
                self.settle(self.ledger.complete(key, &result).await, key);
            }
            TransactionStatus::NotFound => {
                info!(
                    "{} has no record of '{}'; the key may be used again",
                    original.name, key
                );
                self.settle(self.ledger.release(key).await, key);
            }
            TransactionStatus::Pending => {
                self.settle(self.ledger.mark_unknown(key).await, key);
            }
        }
        Ok(Execution {
            provider_id: original.id,
            result,
            source: ExecutionSource::Requeried,
        })
    }

    /// One vendor call: rate limit, timeout, health feedback.
    async fn call(
        &self,
        provider: &Provider,
        operation: VendorOperation,
        payload: &VendorPayload,
        request_id: Option<&str>,
    ) -> Result<VendorResult> {
        let provider_key = Cow::Owned(provider.id.clone());
        if let Err(rejection) = self
            .rate_limiter
            .try_acquire(&provider_key, &provider.rate_limit)
        {
            warn!(
                "Rate limit reached for {} (per {}), refusing {}",
                provider.name, rejection.window, operation
            );
            return Err(Error::RateLimitExceeded {
                provider: provider.name.clone(),
                window: rejection.window,
                retry_after: rejection.retry_after,
            });
        }

        let adapter = self.adapters.get(provider.vendor_kind).ok_or_else(|| {
            Error::Unexpected(format!("no adapter registered for {}", provider.vendor_kind))
        })?;

        let timeout = self.config.timeout_for(operation);
        let ctx = provider.vendor_context(timeout);
        let started = Instant::now();
        let outcome = match tokio::time::timeout(
            timeout,
            adapter.call(&ctx, operation, payload, request_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(VendorError::Timeout {
                provider: provider.name.clone(),
            }),
        };
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let counts = match &outcome {
            Ok(_) => true,
            Err(e) => e.counts_against_health(),
        };
        if counts {
            if let Err(e) = self
                .health
                .record(&provider.id, outcome.is_ok(), latency_ms)
                .await
            {
                warn!("Failed to record health for {}: {}", provider.name, e);
            }
        }
        debug!("{} {} finished in {}ms", provider.name, operation, latency_ms);

        outcome.map_err(Error::from)
    }

    fn settle(&self, written: Result<()>, key: &str) {
        if let Err(e) = written {
            error!("Failed to update ledger entry '{}': {}", key, e);
        }
    }
}
