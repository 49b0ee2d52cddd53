//! Stock Ledger Engine
//!
//! Per-location, per-variant inventory quantity and weighted-average
//! valuation, maintained as an append-only movement ledger with
//! workflow state machines (intake purchases, transfers, warehouse
//! stock requests, modifications) producing the ledger entries.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod key_lock;
pub mod migrator;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Common pagination parameters for list endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

pub fn default_page() -> u64 {
    1
}
pub fn default_limit() -> u64 {
    20
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, query: &ListQuery) -> Self {
        let limit = query.limit.max(1);
        Self {
            items,
            total,
            page: query.page.max(1),
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

#[cfg(test)]
mod pagination_tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let query = ListQuery { page: 1, limit: 20 };
        let response = PaginatedResponse::new(vec![1, 2, 3], 41, &query);
        assert_eq!(response.total_pages, 3);
    }

    #[test]
    fn zero_limit_is_clamped() {
        let query = ListQuery { page: 0, limit: 0 };
        let response: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 5, &query);
        assert_eq!(response.limit, 1);
        assert_eq!(response.page, 1);
        assert_eq!(response.total_pages, 5);
    }
}
