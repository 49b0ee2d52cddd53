use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::stock_modification::ModificationReason;
use crate::errors::ServiceError;
use crate::services::modifications::CreateModification;
use crate::{AppState, ListQuery, PaginatedResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateModificationRequest {
    pub variant_id: Uuid,
    pub location_id: Uuid,
    pub quantity: Decimal,
    pub value: Option<Decimal>,
    pub reason: ModificationReason,
    pub staff_id: Uuid,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ModificationFilters {
    pub variant_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

pub fn modifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_modifications).post(create_modification))
        .route("/:id", get(get_modification))
}

/// Records a signed correction; the MODIFICATION movement lands
/// immediately, there is no approval step.
#[utoipa::path(
    post,
    path = "/api/v1/modifications",
    request_body = CreateModificationRequest,
    responses(
        (status = 201, description = "Modification recorded"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "modifications"
)]
pub async fn create_modification(
    State(state): State<AppState>,
    Json(payload): Json<CreateModificationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = CreateModification {
        variant_id: payload.variant_id,
        location_id: payload.location_id,
        quantity: payload.quantity,
        value: payload.value,
        reason: payload.reason,
        staff_id: payload.staff_id,
        comment: payload.comment,
    };
    let modification = state.services.modifications.create(input).await?;
    Ok((StatusCode::CREATED, Json(modification)))
}

#[utoipa::path(
    get,
    path = "/api/v1/modifications",
    params(ModificationFilters),
    responses((status = 200, description = "Modifications listed")),
    tag = "modifications"
)]
pub async fn list_modifications(
    State(state): State<AppState>,
    Query(filters): Query<ModificationFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .modifications
        .list(filters.variant_id, filters.location_id, filters.page, filters.limit)
        .await?;
    let query = ListQuery {
        page: filters.page,
        limit: filters.limit,
    };
    Ok(Json(PaginatedResponse::new(items, total, &query)))
}

#[utoipa::path(
    get,
    path = "/api/v1/modifications/{id}",
    params(("id" = Uuid, Path, description = "Modification id")),
    responses(
        (status = 200, description = "Modification found"),
        (status = 404, description = "Unknown modification", body = crate::errors::ErrorResponse)
    ),
    tag = "modifications"
)]
pub async fn get_modification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.modifications.get(id).await?))
}
