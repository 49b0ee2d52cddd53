use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::entities::location::LocationKind;
use crate::errors::ServiceError;
use crate::{AppState, ListQuery, PaginatedResponse};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStockRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub category: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVariantRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub unit: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub kind: LocationKind,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VariantFilters {
    pub stock_id: Option<Uuid>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

pub fn catalog_router() -> Router<AppState> {
    Router::new()
        .route("/stocks", get(list_stocks).post(create_stock))
        .route("/stocks/:id", get(get_stock))
        .route("/stocks/:id/variants", axum::routing::post(create_variant))
        .route("/variants", get(list_variants))
        .route("/variants/:id", get(get_variant))
        .route("/locations", get(list_locations).post(create_location))
        .route("/locations/:id", get(get_location))
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route("/suppliers/:id", get(get_supplier))
}

#[utoipa::path(
    post,
    path = "/api/v1/catalog/stocks",
    request_body = CreateStockRequest,
    responses(
        (status = 201, description = "Stock created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_stock(
    State(state): State<AppState>,
    Json(payload): Json<CreateStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let stock = state
        .services
        .catalog
        .create_stock(payload.name, payload.category, payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(stock)))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog/stocks",
    params(ListQuery),
    responses((status = 200, description = "Stocks listed")),
    tag = "catalog"
)]
pub async fn list_stocks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .catalog
        .list_stocks(query.page, query.limit)
        .await?;
    Ok(Json(PaginatedResponse::new(items, total, &query)))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog/stocks/{id}",
    params(("id" = Uuid, Path, description = "Stock id")),
    responses(
        (status = 200, description = "Stock found"),
        (status = 404, description = "Unknown stock", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.catalog.get_stock(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/catalog/stocks/{id}/variants",
    params(("id" = Uuid, Path, description = "Parent stock id")),
    request_body = CreateVariantRequest,
    responses(
        (status = 201, description = "Variant created"),
        (status = 404, description = "Unknown stock", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateVariantRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let variant = state
        .services
        .catalog
        .create_variant(id, payload.name, payload.unit)
        .await?;
    Ok((StatusCode::CREATED, Json(variant)))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog/variants",
    params(VariantFilters),
    responses((status = 200, description = "Variants listed")),
    tag = "catalog"
)]
pub async fn list_variants(
    State(state): State<AppState>,
    Query(filters): Query<VariantFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .catalog
        .list_variants(filters.stock_id, filters.page, filters.limit)
        .await?;
    let query = ListQuery {
        page: filters.page,
        limit: filters.limit,
    };
    Ok(Json(PaginatedResponse::new(items, total, &query)))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog/variants/{id}",
    params(("id" = Uuid, Path, description = "Variant id")),
    responses(
        (status = 200, description = "Variant found"),
        (status = 404, description = "Unknown variant", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.catalog.get_variant(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/catalog/locations",
    request_body = CreateLocationRequest,
    responses((status = 201, description = "Location created")),
    tag = "catalog"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let location = state
        .services
        .catalog
        .create_location(payload.name, payload.kind)
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog/locations",
    params(ListQuery),
    responses((status = 200, description = "Locations listed")),
    tag = "catalog"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .catalog
        .list_locations(query.page, query.limit)
        .await?;
    Ok(Json(PaginatedResponse::new(items, total, &query)))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog/locations/{id}",
    params(("id" = Uuid, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location found"),
        (status = 404, description = "Unknown location", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.catalog.get_location(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/catalog/suppliers",
    request_body = CreateSupplierRequest,
    responses((status = 201, description = "Supplier created")),
    tag = "catalog"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let supplier = state
        .services
        .catalog
        .create_supplier(payload.name, payload.email, payload.phone)
        .await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog/suppliers",
    params(ListQuery),
    responses((status = 200, description = "Suppliers listed")),
    tag = "catalog"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .catalog
        .list_suppliers(query.page, query.limit)
        .await?;
    Ok(Json(PaginatedResponse::new(items, total, &query)))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier found"),
        (status = 404, description = "Unknown supplier", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.services.catalog.get_supplier(id).await?))
}
