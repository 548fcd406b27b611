use std::str::FromStr;
use std::sync::Arc;

use axum::{routing::get, Router};
use billpay_vendors::ServiceCategory;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

mod checkout;
mod commissions;
mod providers;

pub async fn healthz() -> &'static str {
    "ok"
}

pub(crate) fn parse_category(raw: &str) -> ApiResult<ServiceCategory> {
    ServiceCategory::from_str(raw).map_err(ApiError::BadRequest)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allow_origins.iter().any(|o| o == "*") {
        return CorsLayer::new().allow_origin(Any);
    }
    let origins = config
        .cors_allow_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect::<Vec<_>>();
    CorsLayer::new().allow_origin(origins)
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let api = Router::new()
        .route("/healthz", get(healthz))
        .merge(providers::router())
        .merge(commissions::router())
        .merge(checkout::router());

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors_layer(config))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
