use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::key_lock::BalanceKey;
use crate::services::balances::{Balance, BalanceAudit};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct BalanceQuery {
    pub location_id: Uuid,
    pub variant_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecomputeRequest {
    pub location_id: Uuid,
    pub variant_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub location_id: Uuid,
    pub variant_id: Uuid,
    #[serde(flatten)]
    pub balance: Balance,
}

pub fn balances_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_balance))
        .route("/recompute", post(recompute_balance))
        .route("/audit", get(audit_balance))
}

/// Projected balance for one (location, variant) key.
#[utoipa::path(
    get,
    path = "/api/v1/balances",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Projected balance", body = BalanceResponse),
        (status = 404, description = "Unknown key", body = crate::errors::ErrorResponse)
    ),
    tag = "balances"
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.get_variant(query.variant_id).await?;
    state.services.catalog.get_location(query.location_id).await?;

    let key = BalanceKey::new(query.location_id, query.variant_id);
    let balance = state
        .services
        .projector
        .get_balance(state.db.as_ref(), key)
        .await?;
    Ok(Json(BalanceResponse {
        location_id: query.location_id,
        variant_id: query.variant_id,
        balance,
    }))
}

/// Full fold from the ledger, replacing the cached projection (repair).
#[utoipa::path(
    post,
    path = "/api/v1/balances/recompute",
    request_body = RecomputeRequest,
    responses((status = 200, description = "Recomputed balance", body = BalanceResponse)),
    tag = "balances"
)]
pub async fn recompute_balance(
    State(state): State<AppState>,
    Json(payload): Json<RecomputeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let key = BalanceKey::new(payload.location_id, payload.variant_id);
    let balance = state
        .services
        .projector
        .recompute(state.db.as_ref(), key)
        .await?;
    Ok(Json(BalanceResponse {
        location_id: payload.location_id,
        variant_id: payload.variant_id,
        balance,
    }))
}

/// Compares the incremental cache against a full fold without repairing.
#[utoipa::path(
    get,
    path = "/api/v1/balances/audit",
    params(BalanceQuery),
    responses((status = 200, description = "Audit result", body = BalanceAudit)),
    tag = "balances"
)]
pub async fn audit_balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let key = BalanceKey::new(query.location_id, query.variant_id);
    let audit = state.services.projector.audit(state.db.as_ref(), key).await?;
    Ok(Json(audit))
}
