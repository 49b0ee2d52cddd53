// Each integration test binary pulls in the helpers it needs.
#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use stock_ledger_api::db::{self, DbConfig, DbPool};
use stock_ledger_api::entities::location::{self, LocationKind};
use stock_ledger_api::entities::movement_record::MovementType;
use stock_ledger_api::entities::{stock, stock_variant, supplier};
use stock_ledger_api::events::{process_events, EventSender};
use stock_ledger_api::handlers::AppServices;
use stock_ledger_api::services::ledger::MovementDraft;
use tokio::sync::mpsc;

/// Everything a test needs: a migrated in-memory database and the full
/// service graph wired the way `main` wires it.
pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
}

pub async fn setup() -> TestApp {
    // A single connection keeps the in-memory database alive and shared;
    // a larger pool would hand each connection its own empty database.
    let db_cfg = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = db::establish_connection_with_config(&db_cfg)
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let db = Arc::new(pool);

    let (tx, rx) = mpsc::channel(256);
    let event_sender = EventSender::new(tx);
    tokio::spawn(process_events(rx));

    let services = AppServices::new(db.clone(), event_sender);
    TestApp { db, services }
}

pub async fn seed_variant(app: &TestApp) -> stock_variant::Model {
    seed_variant_in_category(app, "beverages").await
}

pub async fn seed_variant_in_category(app: &TestApp, category: &str) -> stock_variant::Model {
    let stock: stock::Model = app
        .services
        .catalog
        .create_stock("Coffee Beans".to_string(), category.to_string(), None)
        .await
        .expect("create stock");
    app.services
        .catalog
        .create_variant(stock.id, "1kg bag".to_string(), "bag".to_string())
        .await
        .expect("create variant")
}

pub async fn seed_store(app: &TestApp, name: &str) -> location::Model {
    app.services
        .catalog
        .create_location(name.to_string(), LocationKind::Store)
        .await
        .expect("create store")
}

pub async fn seed_warehouse(app: &TestApp, name: &str) -> location::Model {
    app.services
        .catalog
        .create_location(name.to_string(), LocationKind::Warehouse)
        .await
        .expect("create warehouse")
}

pub async fn seed_supplier(app: &TestApp) -> supplier::Model {
    app.services
        .catalog
        .create_supplier("Acme Wholesale".to_string(), None, None)
        .await
        .expect("create supplier")
}

/// Puts stock on a balance directly through the ledger.
pub async fn seed_intake(
    app: &TestApp,
    variant: &stock_variant::Model,
    location: &location::Model,
    quantity: Decimal,
    value: Decimal,
) {
    let draft = MovementDraft::new(
        variant.id,
        location.id,
        MovementType::Intake,
        quantity,
        Some(value),
        None,
    );
    app.services.ledger.append(draft).await.expect("seed intake");
}
