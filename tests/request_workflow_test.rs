mod common;

use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use stock_ledger_api::entities::movement_record;
use stock_ledger_api::entities::stock_request::ApprovalStatus;
use stock_ledger_api::errors::ServiceError;
use stock_ledger_api::key_lock::BalanceKey;
use stock_ledger_api::services::requests::CreateStockRequest;
use uuid::Uuid;

use common::{seed_intake, seed_store, seed_variant, seed_warehouse, setup};

#[tokio::test]
async fn request_source_must_be_a_warehouse() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store_a = seed_store(&app, "Downtown").await;
    let store_b = seed_store(&app, "Uptown").await;

    let err = app
        .services
        .requests
        .create(CreateStockRequest {
            variant_id: variant.id,
            warehouse_id: store_a.id,
            location_id: store_b.id,
            quantity: dec!(5),
            value: None,
            requested_by: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn approved_request_moves_stock_out_of_the_warehouse() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let warehouse = seed_warehouse(&app, "Central Warehouse").await;
    let store = seed_store(&app, "Downtown").await;
    seed_intake(&app, &variant, &warehouse, dec!(50), dec!(5000)).await;

    let request = app
        .services
        .requests
        .create(CreateStockRequest {
            variant_id: variant.id,
            warehouse_id: warehouse.id,
            location_id: store.id,
            quantity: dec!(8),
            value: None,
            requested_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    assert_eq!(request.status(), Some(ApprovalStatus::Pending));

    let approved = app
        .services
        .requests
        .approve(request.id, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(approved.status(), Some(ApprovalStatus::Approved));
    assert!(approved.approved_date.is_some());
    assert_eq!(approved.value, Some(dec!(800)));

    let warehouse_balance = app
        .services
        .projector
        .get_balance(app.db.as_ref(), BalanceKey::new(warehouse.id, variant.id))
        .await
        .unwrap();
    let store_balance = app
        .services
        .projector
        .get_balance(app.db.as_ref(), BalanceKey::new(store.id, variant.id))
        .await
        .unwrap();
    assert_eq!(warehouse_balance.total_quantity, dec!(42));
    assert_eq!(store_balance.total_quantity, dec!(8));
    assert_eq!(store_balance.average_value, dec!(100));

    let legs = movement_record::Entity::find()
        .filter(movement_record::Column::ReferenceId.eq(request.id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(legs.len(), 2);
}

#[tokio::test]
async fn cancelled_request_is_terminal() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let warehouse = seed_warehouse(&app, "Central Warehouse").await;
    let store = seed_store(&app, "Downtown").await;
    seed_intake(&app, &variant, &warehouse, dec!(10), dec!(1000)).await;

    let request = app
        .services
        .requests
        .create(CreateStockRequest {
            variant_id: variant.id,
            warehouse_id: warehouse.id,
            location_id: store.id,
            quantity: dec!(3),
            value: None,
            requested_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    app.services.requests.cancel(request.id).await.unwrap();

    let err = app
        .services
        .requests
        .approve(request.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStateTransition(_)));

    // No ledger effect from the cancelled request.
    let legs = movement_record::Entity::find()
        .filter(movement_record::Column::ReferenceId.eq(request.id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert!(legs.is_empty());
}

#[tokio::test]
async fn insufficient_warehouse_stock_rejects_approval() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let warehouse = seed_warehouse(&app, "Central Warehouse").await;
    let store = seed_store(&app, "Downtown").await;
    seed_intake(&app, &variant, &warehouse, dec!(2), dec!(200)).await;

    let request = app
        .services
        .requests
        .create(CreateStockRequest {
            variant_id: variant.id,
            warehouse_id: warehouse.id,
            location_id: store.id,
            quantity: dec!(5),
            value: None,
            requested_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    let err = app
        .services
        .requests
        .approve(request.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let reloaded = app.services.requests.get(request.id).await.unwrap();
    assert_eq!(reloaded.status(), Some(ApprovalStatus::Pending));
}
