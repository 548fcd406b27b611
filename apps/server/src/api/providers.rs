use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use billpay_core::{
    health::HealthProbeResult,
    providers::{NewProvider, Provider, ProviderFilter, ProviderUpdate},
    routing::RoutingDecision,
};

use super::parse_category;
use crate::{error::ApiResult, main_lib::AppState};

// Credentials leave the server masked, always.

async fn list_providers(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ProviderFilter>,
) -> ApiResult<Json<Vec<Provider>>> {
    let providers = state.provider_service.list(&filter)?;
    Ok(Json(providers.iter().map(Provider::masked).collect()))
}

async fn register_provider(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewProvider>,
) -> ApiResult<(StatusCode, Json<Provider>)> {
    let created = state.provider_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(created.masked())))
}

async fn get_provider(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Provider>> {
    let provider = state.provider_service.get(&id)?;
    Ok(Json(provider.masked()))
}

async fn update_provider(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(patch): Json<ProviderUpdate>,
) -> ApiResult<Json<Provider>> {
    let updated = state.provider_service.update(&id, patch).await?;
    Ok(Json(updated.masked()))
}

async fn remove_provider(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Provider>> {
    let removed = state.provider_service.remove(&id).await?;
    Ok(Json(removed.masked()))
}

async fn activate_provider(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Provider>> {
    let provider = state.provider_service.set_active(&id).await?;
    Ok(Json(provider.masked()))
}

async fn deactivate_providers(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.provider_service.clear_active().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_default_provider(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Provider>> {
    let provider = state.provider_service.set_default(&id).await?;
    Ok(Json(provider.masked()))
}

/// Run a connectivity test now. A failed probe is still a 200; the outcome
/// is in the body.
async fn probe_provider(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<HealthProbeResult>> {
    state.provider_service.get(&id)?;
    let result = state.health_monitor.probe(&id).await;
    Ok(Json(result))
}

async fn route_category(
    Path(category): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RoutingDecision>> {
    let category = parse_category(&category)?;
    let mut decision = state.routing_service.route(category)?;
    decision.provider = decision.provider.masked();
    Ok(Json(decision))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/providers", get(list_providers).post(register_provider))
        .route("/providers/deactivate", post(deactivate_providers))
        .route(
            "/providers/{id}",
            get(get_provider)
                .patch(update_provider)
                .delete(remove_provider),
        )
        .route("/providers/{id}/activate", post(activate_provider))
        .route("/providers/{id}/default", post(set_default_provider))
        .route("/providers/{id}/probe", post(probe_provider))
        .route("/routing/{category}", get(route_category))
}
