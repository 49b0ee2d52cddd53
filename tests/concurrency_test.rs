mod common;

use rust_decimal_macros::dec;
use stock_ledger_api::entities::stock_modification::ModificationReason;
use stock_ledger_api::entities::stock_transfer::ApprovalStatus;
use stock_ledger_api::key_lock::BalanceKey;
use stock_ledger_api::services::consumptions::RecordConsumption;
use stock_ledger_api::services::modifications::CreateModification;
use stock_ledger_api::services::transfers::CreateTransfer;
use uuid::Uuid;

use common::{seed_intake, seed_store, seed_variant, setup};

#[tokio::test]
async fn concurrent_consumptions_never_oversell() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;
    seed_intake(&app, &variant, &store, dec!(10), dec!(1000)).await;

    // 20 concurrent draws of 1 unit against a stock of 10: exactly 10
    // succeed, the rest fail with InsufficientStock.
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let consumptions = app.services.consumptions.clone();
        let variant_id = variant.id;
        let location_id = store.id;
        tasks.push(tokio::spawn(async move {
            consumptions
                .record(RecordConsumption {
                    variant_id,
                    location_id,
                    quantity: dec!(1),
                    order_item_id: Uuid::new_v4(),
                })
                .await
                .is_ok()
        }));
    }
    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 10, "exactly the available stock should sell");

    let balance = app
        .services
        .projector
        .get_balance(app.db.as_ref(), BalanceKey::new(store.id, variant.id))
        .await
        .unwrap();
    assert_eq!(balance.total_quantity, dec!(0));

    let audit = app
        .services
        .projector
        .audit(app.db.as_ref(), BalanceKey::new(store.id, variant.id))
        .await
        .unwrap();
    assert!(audit.consistent);
}

#[tokio::test]
async fn concurrent_workflows_on_the_same_key_serialize() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let source = seed_store(&app, "Downtown").await;
    let destination = seed_store(&app, "Uptown").await;
    seed_intake(&app, &variant, &source, dec!(20), dec!(2000)).await;

    let transfer = app
        .services
        .transfers
        .create(CreateTransfer {
            variant_id: variant.id,
            from_location_id: source.id,
            to_location_id: destination.id,
            quantity: dec!(5),
            value: None,
            staff_id: Uuid::new_v4(),
            notes: None,
        })
        .await
        .unwrap();

    let approve = {
        let transfers = app.services.transfers.clone();
        let id = transfer.id;
        tokio::spawn(async move { transfers.approve(id, Uuid::new_v4()).await })
    };
    let modify = {
        let modifications = app.services.modifications.clone();
        let variant_id = variant.id;
        let location_id = source.id;
        tokio::spawn(async move {
            modifications
                .create(CreateModification {
                    variant_id,
                    location_id,
                    quantity: dec!(-3),
                    value: None,
                    reason: ModificationReason::Damage,
                    staff_id: Uuid::new_v4(),
                    comment: None,
                })
                .await
        })
    };

    approve.await.unwrap().expect("approve");
    modify.await.unwrap().expect("modify");

    // Quantity deltas commute: 20 - 5 - 3 regardless of interleaving.
    let source_balance = app
        .services
        .projector
        .get_balance(app.db.as_ref(), BalanceKey::new(source.id, variant.id))
        .await
        .unwrap();
    assert_eq!(source_balance.total_quantity, dec!(12));

    for key in [
        BalanceKey::new(source.id, variant.id),
        BalanceKey::new(destination.id, variant.id),
    ] {
        let audit = app.services.projector.audit(app.db.as_ref(), key).await.unwrap();
        assert!(audit.consistent, "cache diverged for {:?}: {:?}", key, audit);
    }
}

#[tokio::test]
async fn racing_approvals_resolve_to_one_winner() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let source = seed_store(&app, "Downtown").await;
    let destination = seed_store(&app, "Uptown").await;
    seed_intake(&app, &variant, &source, dec!(10), dec!(1000)).await;

    let transfer = app
        .services
        .transfers
        .create(CreateTransfer {
            variant_id: variant.id,
            from_location_id: source.id,
            to_location_id: destination.id,
            quantity: dec!(4),
            value: None,
            staff_id: Uuid::new_v4(),
            notes: None,
        })
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let transfers = app.services.transfers.clone();
        let id = transfer.id;
        tasks.push(tokio::spawn(async move {
            transfers.approve(id, Uuid::new_v4()).await.is_ok()
        }));
    }
    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1, "exactly one approval may win");

    let reloaded = app.services.transfers.get(transfer.id).await.unwrap();
    assert_eq!(reloaded.status(), Some(ApprovalStatus::Approved));

    // The single approval moved the stock exactly once.
    let source_balance = app
        .services
        .projector
        .get_balance(app.db.as_ref(), BalanceKey::new(source.id, variant.id))
        .await
        .unwrap();
    assert_eq!(source_balance.total_quantity, dec!(6));
}
