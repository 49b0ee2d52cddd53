use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::entities::stock_intake_purchase::PurchaseStatus;
use crate::errors::ServiceError;
use crate::services::purchases::{CreatePurchase, PurchaseLineInput};
use crate::{AppState, ListQuery, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PurchaseLineRequest {
    pub variant_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseRequest {
    pub supplier_id: Uuid,
    pub location_id: Uuid,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<PurchaseLineRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PurchaseFilters {
    pub supplier_id: Option<Uuid>,
    pub status: Option<PurchaseStatus>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

pub fn purchases_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_purchases).post(create_purchase))
        .route("/:id", get(get_purchase))
        .route("/:id/confirm-delivery", post(confirm_delivery))
        .route("/:id/payments", post(record_payment))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchases",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 201, description = "Purchase created in DRAFT"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown supplier/location/variant", body = crate::errors::ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let input = CreatePurchase {
        supplier_id: payload.supplier_id,
        location_id: payload.location_id,
        delivery_date: payload.delivery_date,
        notes: payload.notes,
        lines: payload
            .lines
            .into_iter()
            .map(|line| PurchaseLineInput {
                variant_id: line.variant_id,
                quantity: line.quantity,
                unit_cost: line.unit_cost,
            })
            .collect(),
    };
    let details = state.services.purchases.create(input).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    params(PurchaseFilters),
    responses((status = 200, description = "Purchases listed")),
    tag = "purchases"
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    Query(filters): Query<PurchaseFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .purchases
        .list(filters.supplier_id, filters.status, filters.page, filters.limit)
        .await?;
    let query = ListQuery {
        page: filters.page,
        limit: filters.limit,
    };
    Ok(Json(PaginatedResponse::new(items, total, &query)))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchases/{id}",
    params(("id" = Uuid, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase with its lines"),
        (status = 404, description = "Unknown purchase", body = crate::errors::ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn get_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.purchases.get(id).await?))
}

/// DRAFT → RECEIVED; emits one INTAKE movement per line. Idempotent:
/// confirming an already-RECEIVED purchase changes nothing.
#[utoipa::path(
    post,
    path = "/api/v1/purchases/{id}/confirm-delivery",
    params(("id" = Uuid, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase received"),
        (status = 404, description = "Unknown purchase", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent confirmation", body = crate::errors::ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn confirm_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.purchases.confirm_delivery(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchases/{id}/payments",
    params(("id" = Uuid, Path, description = "Purchase id")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded"),
        (status = 400, description = "Amount invalid or exceeds unpaid balance", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent payment; retry", body = crate::errors::ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        state.services.purchases.record_payment(id, payload.amount).await?,
    ))
}
