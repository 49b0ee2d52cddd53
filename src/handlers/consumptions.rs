use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::consumptions::RecordConsumption;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordConsumptionRequest {
    pub variant_id: Uuid,
    pub location_id: Uuid,
    /// Units consumed; positive.
    pub quantity: Decimal,
    pub order_item_id: Uuid,
}

pub fn consumptions_router() -> Router<AppState> {
    Router::new().route("/", post(record_consumption))
}

/// Draws stock down for a storefront order item, valued at the running
/// average.
#[utoipa::path(
    post,
    path = "/api/v1/consumptions",
    request_body = RecordConsumptionRequest,
    responses(
        (status = 201, description = "Consumption movement appended"),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "consumptions"
)]
pub async fn record_consumption(
    State(state): State<AppState>,
    Json(payload): Json<RecordConsumptionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = RecordConsumption {
        variant_id: payload.variant_id,
        location_id: payload.location_id,
        quantity: payload.quantity,
        order_item_id: payload.order_item_id,
    };
    let record = state.services.consumptions.record(input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
