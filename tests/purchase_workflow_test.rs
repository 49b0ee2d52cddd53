mod common;

use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use stock_ledger_api::entities::movement_record::{self, MovementType};
use stock_ledger_api::entities::stock_intake_purchase::{PaymentStatus, PurchaseStatus};
use stock_ledger_api::errors::ServiceError;
use stock_ledger_api::key_lock::BalanceKey;
use stock_ledger_api::services::purchases::{CreatePurchase, PurchaseLineInput};

use common::{seed_store, seed_supplier, seed_variant, setup};

async fn movement_count(app: &common::TestApp) -> u64 {
    movement_record::Entity::find()
        .count(app.db.as_ref())
        .await
        .unwrap()
}

#[tokio::test]
async fn purchase_lifecycle_draft_to_received() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;
    let supplier = seed_supplier(&app).await;

    let details = app
        .services
        .purchases
        .create(CreatePurchase {
            supplier_id: supplier.id,
            location_id: store.id,
            delivery_date: None,
            notes: Some("first order".to_string()),
            lines: vec![
                PurchaseLineInput {
                    variant_id: variant.id,
                    quantity: dec!(10),
                    unit_cost: dec!(100),
                },
                PurchaseLineInput {
                    variant_id: variant.id,
                    quantity: dec!(5),
                    unit_cost: dec!(120),
                },
            ],
        })
        .await
        .unwrap();

    assert_eq!(details.purchase.status(), Some(PurchaseStatus::Draft));
    assert_eq!(details.purchase.payment_status(), Some(PaymentStatus::Unpaid));
    assert_eq!(details.purchase.total_cost, dec!(1600));
    assert_eq!(details.unpaid_amount, dec!(1600));
    assert_eq!(details.lines.len(), 2);
    // DRAFT purchases have no ledger effect.
    assert_eq!(movement_count(&app).await, 0);

    let received = app
        .services
        .purchases
        .confirm_delivery(details.purchase.id)
        .await
        .unwrap();
    assert_eq!(received.purchase.status(), Some(PurchaseStatus::Received));
    assert!(received.purchase.received_at.is_some());

    // One INTAKE per line.
    let intakes = movement_record::Entity::find()
        .filter(movement_record::Column::MovementType.eq(MovementType::Intake.to_string()))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(intakes.len(), 2);
    assert!(intakes
        .iter()
        .all(|r| r.reference_id == Some(details.purchase.id)));

    let key = BalanceKey::new(store.id, variant.id);
    let balance = app
        .services
        .projector
        .get_balance(app.db.as_ref(), key)
        .await
        .unwrap();
    assert_eq!(balance.total_quantity, dec!(15));
    // (10 * 100 + 5 * 120) / 15
    assert_eq!(balance.average_value, dec!(106.6667));
}

#[tokio::test]
async fn confirm_delivery_is_idempotent() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;
    let supplier = seed_supplier(&app).await;

    let details = app
        .services
        .purchases
        .create(CreatePurchase {
            supplier_id: supplier.id,
            location_id: store.id,
            delivery_date: None,
            notes: None,
            lines: vec![PurchaseLineInput {
                variant_id: variant.id,
                quantity: dec!(3),
                unit_cost: dec!(50),
            }],
        })
        .await
        .unwrap();

    app.services
        .purchases
        .confirm_delivery(details.purchase.id)
        .await
        .unwrap();
    let count_after_first = movement_count(&app).await;

    // Re-confirming is a no-op, not an error.
    let second = app
        .services
        .purchases
        .confirm_delivery(details.purchase.id)
        .await
        .unwrap();
    assert_eq!(second.purchase.status(), Some(PurchaseStatus::Received));
    assert_eq!(movement_count(&app).await, count_after_first);
}

#[tokio::test]
async fn payments_drive_the_derived_sub_state() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;
    let supplier = seed_supplier(&app).await;

    let details = app
        .services
        .purchases
        .create(CreatePurchase {
            supplier_id: supplier.id,
            location_id: store.id,
            delivery_date: None,
            notes: None,
            lines: vec![PurchaseLineInput {
                variant_id: variant.id,
                quantity: dec!(10),
                unit_cost: dec!(100),
            }],
        })
        .await
        .unwrap();
    let id = details.purchase.id;

    let after_partial = app.services.purchases.record_payment(id, dec!(400)).await.unwrap();
    assert_eq!(
        after_partial.purchase.payment_status(),
        Some(PaymentStatus::PartiallyPaid)
    );
    assert_eq!(after_partial.purchase.paid_amount, dec!(400));
    assert_eq!(after_partial.unpaid_amount, dec!(600));

    let after_full = app.services.purchases.record_payment(id, dec!(600)).await.unwrap();
    assert_eq!(after_full.purchase.payment_status(), Some(PaymentStatus::Paid));
    assert_eq!(after_full.unpaid_amount, dec!(0));

    // Paid amount never exceeds the total and never goes backwards.
    let overpay = app.services.purchases.record_payment(id, dec!(1)).await;
    assert!(matches!(overpay, Err(ServiceError::Validation(_))));
    let non_positive = app.services.purchases.record_payment(id, dec!(0)).await;
    assert!(matches!(non_positive, Err(ServiceError::Validation(_))));

    // Payments never touch the ledger.
    assert_eq!(movement_count(&app).await, 0);
}

#[tokio::test]
async fn create_validates_lines() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;
    let supplier = seed_supplier(&app).await;

    let no_lines = app
        .services
        .purchases
        .create(CreatePurchase {
            supplier_id: supplier.id,
            location_id: store.id,
            delivery_date: None,
            notes: None,
            lines: vec![],
        })
        .await;
    assert!(matches!(no_lines, Err(ServiceError::Validation(_))));

    let negative_quantity = app
        .services
        .purchases
        .create(CreatePurchase {
            supplier_id: supplier.id,
            location_id: store.id,
            delivery_date: None,
            notes: None,
            lines: vec![PurchaseLineInput {
                variant_id: variant.id,
                quantity: dec!(-2),
                unit_cost: dec!(10),
            }],
        })
        .await;
    assert!(matches!(negative_quantity, Err(ServiceError::Validation(_))));
}
