mod common;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use stock_ledger_api::entities::movement_record::MovementType;
use stock_ledger_api::entities::stock_intake_purchase::PaymentStatus;
use stock_ledger_api::services::consumptions::RecordConsumption;
use stock_ledger_api::services::purchases::{CreatePurchase, PurchaseLineInput};
use stock_ledger_api::services::reports::DateRange;
use uuid::Uuid;

use common::{seed_intake, seed_store, seed_supplier, seed_variant, setup};

fn whole_day() -> DateRange {
    let now = Utc::now();
    DateRange {
        from: now - Duration::hours(1),
        to: now + Duration::hours(1),
    }
}

#[tokio::test]
async fn movement_summary_totals_by_type() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;
    seed_intake(&app, &variant, &store, dec!(10), dec!(1000)).await;
    seed_intake(&app, &variant, &store, dec!(5), dec!(600)).await;
    app.services
        .consumptions
        .record(RecordConsumption {
            variant_id: variant.id,
            location_id: store.id,
            quantity: dec!(3),
            order_item_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let report = app
        .services
        .reports
        .movement_summary(whole_day(), Some(store.id), None)
        .await
        .unwrap();

    let intake_row = report
        .rows
        .iter()
        .find(|row| row.movement_type == MovementType::Intake.to_string())
        .expect("intake row");
    assert_eq!(intake_row.count, 2);
    assert_eq!(intake_row.quantity, dec!(15));
    assert_eq!(intake_row.value, dec!(1600));

    let consumption_row = report
        .rows
        .iter()
        .find(|row| row.movement_type == MovementType::OrderItemConsumption.to_string())
        .expect("consumption row");
    assert_eq!(consumption_row.count, 1);
    assert_eq!(consumption_row.quantity, dec!(-3));

    assert_eq!(report.net_quantity, dec!(12));

    // Identical arguments yield identical results.
    let again = app
        .services
        .reports
        .movement_summary(whole_day(), Some(store.id), None)
        .await
        .unwrap();
    assert_eq!(again.net_quantity, report.net_quantity);
    assert_eq!(again.rows.len(), report.rows.len());
}

#[tokio::test]
async fn movement_summary_scopes_by_category() {
    let app = setup().await;
    let beverages = common::seed_variant_in_category(&app, "beverages").await;
    let pastry = common::seed_variant_in_category(&app, "pastry").await;
    let store = seed_store(&app, "Downtown").await;
    seed_intake(&app, &beverages, &store, dec!(10), dec!(1000)).await;
    seed_intake(&app, &pastry, &store, dec!(4), dec!(200)).await;

    let report = app
        .services
        .reports
        .movement_summary(whole_day(), None, Some("pastry".to_string()))
        .await
        .unwrap();
    assert_eq!(report.net_quantity, dec!(4));
    assert_eq!(report.net_value, dec!(200));
}

#[tokio::test]
async fn purchase_report_counts_by_payment_status() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;
    let supplier = seed_supplier(&app).await;

    let paid = app
        .services
        .purchases
        .create(CreatePurchase {
            supplier_id: supplier.id,
            location_id: store.id,
            delivery_date: None,
            notes: None,
            lines: vec![PurchaseLineInput {
                variant_id: variant.id,
                quantity: dec!(5),
                unit_cost: dec!(10),
            }],
        })
        .await
        .unwrap();
    app.services
        .purchases
        .record_payment(paid.purchase.id, dec!(50))
        .await
        .unwrap();

    app.services
        .purchases
        .create(CreatePurchase {
            supplier_id: supplier.id,
            location_id: store.id,
            delivery_date: None,
            notes: None,
            lines: vec![PurchaseLineInput {
                variant_id: variant.id,
                quantity: dec!(2),
                unit_cost: dec!(30),
            }],
        })
        .await
        .unwrap();

    let report = app
        .services
        .reports
        .purchase_report(whole_day(), Some(supplier.id))
        .await
        .unwrap();
    assert_eq!(report.total_cost, dec!(110));
    assert_eq!(report.total_paid, dec!(50));
    assert_eq!(report.total_unpaid, dec!(60));

    let paid_row = report
        .rows
        .iter()
        .find(|row| row.payment_status == PaymentStatus::Paid.to_string())
        .expect("paid row");
    assert_eq!(paid_row.count, 1);
    let unpaid_row = report
        .rows
        .iter()
        .find(|row| row.payment_status == PaymentStatus::Unpaid.to_string())
        .expect("unpaid row");
    assert_eq!(unpaid_row.count, 1);
    assert_eq!(unpaid_row.unpaid_amount, dec!(60));
}

#[tokio::test]
async fn valuation_derives_from_the_ledger() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;
    seed_intake(&app, &variant, &store, dec!(10), dec!(1000)).await;
    seed_intake(&app, &variant, &store, dec!(5), dec!(600)).await;

    let report = app.services.reports.valuation(Some(store.id)).await.unwrap();
    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert_eq!(row.total_quantity, dec!(15));
    assert_eq!(row.average_value, dec!(106.6667));
    assert_eq!(report.total_value, dec!(15) * dec!(106.6667));
}
