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

use crate::errors::ServiceError;
use crate::services::reports::{
    ApprovalReport, DateRange, MovementSummaryReport, PurchaseReport, ValuationReport,
};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct MovementReportQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub location_id: Option<Uuid>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PurchaseReportQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ApprovalReportQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ValuationQuery {
    pub location_id: Option<Uuid>,
}

pub fn reports_router() -> Router<AppState> {
    Router::new()
        .route("/movements", get(movement_summary))
        .route("/purchases", get(purchase_report))
        .route("/approvals", get(approval_report))
        .route("/valuation", get(valuation_report))
}

fn range(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<DateRange, ServiceError> {
    if from > to {
        return Err(ServiceError::Validation(
            "report range start must not be after its end".to_string(),
        ));
    }
    Ok(DateRange { from, to })
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/movements",
    params(MovementReportQuery),
    responses((status = 200, description = "Movement summary", body = MovementSummaryReport)),
    tag = "reports"
)]
pub async fn movement_summary(
    State(state): State<AppState>,
    Query(query): Query<MovementReportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .reports
        .movement_summary(range(query.from, query.to)?, query.location_id, query.category)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/purchases",
    params(PurchaseReportQuery),
    responses((status = 200, description = "Purchase report", body = PurchaseReport)),
    tag = "reports"
)]
pub async fn purchase_report(
    State(state): State<AppState>,
    Query(query): Query<PurchaseReportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .reports
        .purchase_report(range(query.from, query.to)?, query.supplier_id)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/approvals",
    params(ApprovalReportQuery),
    responses((status = 200, description = "Approval report", body = ApprovalReport)),
    tag = "reports"
)]
pub async fn approval_report(
    State(state): State<AppState>,
    Query(query): Query<ApprovalReportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .reports
        .approval_report(range(query.from, query.to)?)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/valuation",
    params(ValuationQuery),
    responses((status = 200, description = "Stock valuation", body = ValuationReport)),
    tag = "reports"
)]
pub async fn valuation_report(
    State(state): State<AppState>,
    Query(query): Query<ValuationQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state.services.reports.valuation(query.location_id).await?;
    Ok(Json(report))
}
