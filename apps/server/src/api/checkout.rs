use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use billpay_core::checkout::{CheckoutRequest, CheckoutResult};

use crate::{error::ApiResult, main_lib::AppState};

/// Price, route and dispatch one purchase. Retrying with the same
/// `idempotencyKey` never buys twice.
async fn checkout(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<Json<CheckoutResult>> {
    let result = state.checkout_service.purchase(request).await?;
    Ok(Json(result))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/checkout", post(checkout))
}
