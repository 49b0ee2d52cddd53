use axum::{response::IntoResponse, routing::get, Json, Router};
use utoipa::OpenApi;

use crate::AppState;

/// OpenAPI document for the v1 API. Served as JSON; no bundled UI.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stock Ledger API",
        description = "Inventory quantity and weighted-average valuation over an append-only movement ledger",
        version = "0.1.0"
    ),
    paths(
        crate::handlers::health::liveness,
        crate::handlers::health::readiness,
        crate::handlers::catalog::create_stock,
        crate::handlers::catalog::list_stocks,
        crate::handlers::catalog::get_stock,
        crate::handlers::catalog::create_variant,
        crate::handlers::catalog::list_variants,
        crate::handlers::catalog::get_variant,
        crate::handlers::catalog::create_location,
        crate::handlers::catalog::list_locations,
        crate::handlers::catalog::get_location,
        crate::handlers::catalog::create_supplier,
        crate::handlers::catalog::list_suppliers,
        crate::handlers::catalog::get_supplier,
        crate::handlers::balances::get_balance,
        crate::handlers::balances::recompute_balance,
        crate::handlers::balances::audit_balance,
        crate::handlers::movements::list_movements,
        crate::handlers::purchases::create_purchase,
        crate::handlers::purchases::list_purchases,
        crate::handlers::purchases::get_purchase,
        crate::handlers::purchases::confirm_delivery,
        crate::handlers::purchases::record_payment,
        crate::handlers::transfers::create_transfer,
        crate::handlers::transfers::list_transfers,
        crate::handlers::transfers::get_transfer,
        crate::handlers::transfers::approve_transfer,
        crate::handlers::transfers::cancel_transfer,
        crate::handlers::requests::create_stock_request,
        crate::handlers::requests::list_stock_requests,
        crate::handlers::requests::get_stock_request,
        crate::handlers::requests::approve_stock_request,
        crate::handlers::requests::cancel_stock_request,
        crate::handlers::modifications::create_modification,
        crate::handlers::modifications::list_modifications,
        crate::handlers::modifications::get_modification,
        crate::handlers::consumptions::record_consumption,
        crate::handlers::reports::movement_summary,
        crate::handlers::reports::purchase_report,
        crate::handlers::reports::approval_report,
        crate::handlers::reports::valuation_report,
    ),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "catalog", description = "Stocks, variants, locations, suppliers"),
        (name = "balances", description = "Projected balances and audits"),
        (name = "movements", description = "Append-only ledger reads"),
        (name = "purchases", description = "Intake purchase workflow"),
        (name = "transfers", description = "Inter-location transfer workflow"),
        (name = "stock-requests", description = "Warehouse stock request workflow"),
        (name = "modifications", description = "Manual stock corrections"),
        (name = "consumptions", description = "Order-item consumption"),
        (name = "reports", description = "Read-only aggregations")
    )
)]
pub struct ApiDoc;

pub fn openapi_router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
