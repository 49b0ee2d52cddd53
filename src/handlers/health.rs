use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
}

pub fn health_router() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness))
        .route("/ready", get(readiness))
}

/// Process liveness. Always OK while the server is up.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is alive")),
    tag = "health"
)]
pub async fn liveness() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Readiness: verifies the database connection.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthStatus),
        (status = 503, description = "Database unreachable", body = HealthStatus)
    ),
    tag = "health"
)]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match crate::db::check_connection(state.db.as_ref()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthStatus {
                status: "ready".to_string(),
                database: "ok".to_string(),
            }),
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus {
                status: "degraded".to_string(),
                database: err.response_message(),
            }),
        ),
    }
}
