use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::entities::movement_record::MovementType;
use crate::errors::ServiceError;
use crate::services::ledger::MovementFilter;
use crate::{AppState, ListQuery, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MovementFilters {
    pub location_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

pub fn movements_router() -> Router<AppState> {
    Router::new().route("/", get(list_movements))
}

/// Paginated ledger read, newest first. Never mutates the ledger.
#[utoipa::path(
    get,
    path = "/api/v1/movements",
    params(MovementFilters),
    responses((status = 200, description = "Movements listed")),
    tag = "movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(filters): Query<MovementFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = MovementFilter {
        location_id: filters.location_id,
        variant_id: filters.variant_id,
        movement_type: filters.movement_type,
        from: filters.from,
        to: filters.to,
    };
    let (items, total) = state
        .services
        .ledger
        .list(filter, filters.page, filters.limit)
        .await?;
    let query = ListQuery {
        page: filters.page,
        limit: filters.limit,
    };
    Ok(Json(PaginatedResponse::new(items, total, &query)))
}
