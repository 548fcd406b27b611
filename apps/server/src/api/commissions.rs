use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use billpay_core::commission::{CommissionConfig, CommissionRateInput, PriceQuote};
use billpay_vendors::ServiceCategory;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::parse_category;
use crate::{error::ApiResult, main_lib::AppState};

async fn list_commissions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CommissionConfig>>> {
    let configs = state.commission_service.list_configs()?;
    Ok(Json(configs))
}

async fn set_global_commission(
    Path(service): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(input): Json<CommissionRateInput>,
) -> ApiResult<Json<CommissionConfig>> {
    let service = parse_category(&service)?;
    let saved = state.commission_service.set_global(service, input).await?;
    Ok(Json(saved))
}

async fn set_commission_override(
    Path((service, key)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(input): Json<CommissionRateInput>,
) -> ApiResult<Json<CommissionConfig>> {
    let service = parse_category(&service)?;
    let saved = state
        .commission_service
        .set_override(service, &key, input)
        .await?;
    Ok(Json(saved))
}

async fn remove_commission_override(
    Path((service, key)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let service = parse_category(&service)?;
    state
        .commission_service
        .remove_override(service, &key)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequest {
    service: ServiceCategory,
    #[serde(default)]
    key: Option<String>,
    amount: Decimal,
}

async fn quote_price(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QuoteRequest>,
) -> ApiResult<Json<PriceQuote>> {
    let quote = state
        .commission_service
        .price(body.service, body.key.as_deref(), body.amount)?;
    Ok(Json(quote))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/commissions", get(list_commissions))
        .route("/commissions/{service}", put(set_global_commission))
        .route(
            "/commissions/{service}/{key}",
            put(set_commission_override).delete(remove_commission_override),
        )
        .route("/pricing/quote", post(quote_price))
}
