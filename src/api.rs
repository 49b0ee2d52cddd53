use axum::Router;

use crate::handlers;
use crate::AppState;

/// Full v1 API surface, mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/catalog", handlers::catalog::catalog_router())
        .nest("/balances", handlers::balances::balances_router())
        .nest("/movements", handlers::movements::movements_router())
        .nest("/purchases", handlers::purchases::purchases_router())
        .nest("/transfers", handlers::transfers::transfers_router())
        .nest("/stock-requests", handlers::requests::stock_requests_router())
        .nest("/modifications", handlers::modifications::modifications_router())
        .nest("/consumptions", handlers::consumptions::consumptions_router())
        .nest("/reports", handlers::reports::reports_router())
}
