use std::path::Path;
use std::sync::Arc;

use billpay_core::{
    checkout::CheckoutService,
    commission::{CommissionService, CommissionServiceTrait},
    execution::ExecutionService,
    health::HealthMonitor,
    providers::{ProviderRepositoryTrait, ProviderService, ProviderServiceTrait},
    routing::RoutingService,
};
use billpay_storage_sqlite::{
    db, CommissionRepository, ProviderRepository, SqliteIdempotencyLedger,
};
use billpay_vendors::{RateLimiter, VendorAdapters};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub provider_service: Arc<dyn ProviderServiceTrait + Send + Sync>,
    pub commission_service: Arc<dyn CommissionServiceTrait + Send + Sync>,
    pub routing_service: Arc<RoutingService>,
    pub health_monitor: Arc<HealthMonitor>,
    pub checkout_service: Arc<CheckoutService>,
}

/// Load a dotenv file into the process environment, `./.env` when `path` is
/// `None`. Variables already set win. Must run before [`init_tracing`] so
/// `RUST_LOG` and `BP_LOG_FORMAT` from the file apply.
pub fn load_env_file(path: Option<&Path>) {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|_| ()),
        None => dotenvy::dotenv().map(|_| ()),
    };
    if let Err(e) = loaded {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. `log` records from the library crates are
/// forwarded into tracing.
pub fn init_tracing() {
    let log_format = std::env::var("BP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let registry = tracing_subscriber::registry().with(log_filter());

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    build_state_with_adapters(config, VendorAdapters::with_defaults()).await
}

/// Wire the services over the SQLite store using the given adapter set.
pub async fn build_state_with_adapters(
    config: &Config,
    adapters: VendorAdapters,
) -> anyhow::Result<Arc<AppState>> {
    let (pool, writer) = db::open(&config.db_path)?;
    tracing::info!("Database path in use: {}", config.db_path);

    let provider_repository: Arc<dyn ProviderRepositoryTrait> =
        Arc::new(ProviderRepository::new(pool.clone(), writer.clone()));
    let commission_repository = Arc::new(CommissionRepository::new(pool.clone(), writer.clone()));
    let ledger = Arc::new(SqliteIdempotencyLedger::new(pool.clone(), writer.clone()));
    let rate_limiter = Arc::new(RateLimiter::new());

    let provider_service = Arc::new(ProviderService::new(provider_repository.clone()));
    let commission_service = Arc::new(CommissionService::new(commission_repository));
    let routing_service = Arc::new(RoutingService::new(provider_repository.clone()));
    let health_monitor = Arc::new(HealthMonitor::new(
        provider_repository.clone(),
        adapters.clone(),
        rate_limiter.clone(),
        config.health.clone(),
    )?);
    let execution_service = Arc::new(ExecutionService::new(
        provider_repository.clone(),
        adapters,
        rate_limiter,
        health_monitor.clone(),
        ledger,
        config.execution.clone(),
    )?);
    let checkout_service = Arc::new(CheckoutService::new(
        commission_service.clone(),
        routing_service.clone(),
        execution_service,
        provider_repository,
    ));

    Ok(Arc::new(AppState {
        provider_service,
        commission_service,
        routing_service,
        health_monitor,
        checkout_service,
    }))
}
