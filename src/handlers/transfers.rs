use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::stock_transfer::ApprovalStatus;
use crate::errors::ServiceError;
use crate::services::transfers::CreateTransfer;
use crate::{AppState, ListQuery, PaginatedResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransferRequest {
    pub variant_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub quantity: Decimal,
    pub value: Option<Decimal>,
    pub staff_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveRequest {
    pub approved_by: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TransferFilters {
    pub status: Option<ApprovalStatus>,
    pub variant_id: Option<Uuid>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

pub fn transfers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transfers).post(create_transfer))
        .route("/:id", get(get_transfer))
        .route("/:id/approve", post(approve_transfer))
        .route("/:id/cancel", post(cancel_transfer))
}

#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body = CreateTransferRequest,
    responses(
        (status = 201, description = "Transfer created in PENDING"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransferRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = CreateTransfer {
        variant_id: payload.variant_id,
        from_location_id: payload.from_location_id,
        to_location_id: payload.to_location_id,
        quantity: payload.quantity,
        value: payload.value,
        staff_id: payload.staff_id,
        notes: payload.notes,
    };
    let transfer = state.services.transfers.create(input).await?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

#[utoipa::path(
    get,
    path = "/api/v1/transfers",
    params(TransferFilters),
    responses((status = 200, description = "Transfers listed")),
    tag = "transfers"
)]
pub async fn list_transfers(
    State(state): State<AppState>,
    Query(filters): Query<TransferFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .transfers
        .list(filters.status, filters.variant_id, filters.page, filters.limit)
        .await?;
    let query = ListQuery {
        page: filters.page,
        limit: filters.limit,
    };
    Ok(Json(PaginatedResponse::new(items, total, &query)))
}

#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}",
    params(("id" = Uuid, Path, description = "Transfer id")),
    responses(
        (status = 200, description = "Transfer found"),
        (status = 404, description = "Unknown transfer", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.transfers.get(id).await?))
}

/// PENDING → APPROVED: emits the TRANSFER_OUT / TRANSFER_IN pair
/// atomically, or nothing on failure.
#[utoipa::path(
    post,
    path = "/api/v1/transfers/{id}/approve",
    params(("id" = Uuid, Path, description = "Transfer id")),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Transfer approved"),
        (status = 409, description = "Not PENDING", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock at source", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn approve_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        state.services.transfers.approve(id, payload.approved_by).await?,
    ))
}

/// PENDING → CANCELLED: terminal, no ledger effect.
#[utoipa::path(
    post,
    path = "/api/v1/transfers/{id}/cancel",
    params(("id" = Uuid, Path, description = "Transfer id")),
    responses(
        (status = 200, description = "Transfer cancelled"),
        (status = 409, description = "Not PENDING", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn cancel_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.transfers.cancel(id).await?))
}
