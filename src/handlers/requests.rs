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

use crate::entities::stock_request::ApprovalStatus;
use crate::errors::ServiceError;
use crate::services::requests::CreateStockRequest;
use crate::{AppState, ListQuery, PaginatedResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStockRequestRequest {
    pub variant_id: Uuid,
    pub warehouse_id: Uuid,
    pub location_id: Uuid,
    pub quantity: Decimal,
    pub value: Option<Decimal>,
    pub requested_by: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveRequest {
    pub approved_by: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StockRequestFilters {
    pub status: Option<ApprovalStatus>,
    pub warehouse_id: Option<Uuid>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

pub fn stock_requests_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stock_requests).post(create_stock_request))
        .route("/:id", get(get_stock_request))
        .route("/:id/approve", post(approve_stock_request))
        .route("/:id/cancel", post(cancel_stock_request))
}

#[utoipa::path(
    post,
    path = "/api/v1/stock-requests",
    request_body = CreateStockRequestRequest,
    responses(
        (status = 201, description = "Stock request created in PENDING"),
        (status = 400, description = "Invalid input or source not a warehouse", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-requests"
)]
pub async fn create_stock_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateStockRequestRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = CreateStockRequest {
        variant_id: payload.variant_id,
        warehouse_id: payload.warehouse_id,
        location_id: payload.location_id,
        quantity: payload.quantity,
        value: payload.value,
        requested_by: payload.requested_by,
    };
    let request = state.services.requests.create(input).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stock-requests",
    params(StockRequestFilters),
    responses((status = 200, description = "Stock requests listed")),
    tag = "stock-requests"
)]
pub async fn list_stock_requests(
    State(state): State<AppState>,
    Query(filters): Query<StockRequestFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .requests
        .list(filters.status, filters.warehouse_id, filters.page, filters.limit)
        .await?;
    let query = ListQuery {
        page: filters.page,
        limit: filters.limit,
    };
    Ok(Json(PaginatedResponse::new(items, total, &query)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stock-requests/{id}",
    params(("id" = Uuid, Path, description = "Stock request id")),
    responses(
        (status = 200, description = "Stock request found"),
        (status = 404, description = "Unknown stock request", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-requests"
)]
pub async fn get_stock_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.requests.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/stock-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Stock request id")),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Stock request approved"),
        (status = 409, description = "Not PENDING", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient warehouse stock", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-requests"
)]
pub async fn approve_stock_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        state.services.requests.approve(id, payload.approved_by).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/stock-requests/{id}/cancel",
    params(("id" = Uuid, Path, description = "Stock request id")),
    responses(
        (status = 200, description = "Stock request cancelled"),
        (status = 409, description = "Not PENDING", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-requests"
)]
pub async fn cancel_stock_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.requests.cancel(id).await?))
}
