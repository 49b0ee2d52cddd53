mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use stock_ledger_api::entities::movement_record::{self, MovementType};
use stock_ledger_api::errors::ServiceError;
use stock_ledger_api::key_lock::BalanceKey;
use stock_ledger_api::services::ledger::MovementDraft;
use uuid::Uuid;

use common::{seed_intake, seed_store, seed_variant, setup};

#[tokio::test]
async fn weighted_average_blends_on_intake() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;

    seed_intake(&app, &variant, &store, dec!(10), dec!(1000)).await;
    seed_intake(&app, &variant, &store, dec!(5), dec!(600)).await;

    let key = BalanceKey::new(store.id, variant.id);
    let balance = app
        .services
        .projector
        .get_balance(app.db.as_ref(), key)
        .await
        .unwrap();
    assert_eq!(balance.total_quantity, dec!(15));
    // (100 * 10 + 600) / 15
    assert_eq!(balance.average_value, dec!(106.6667));
}

#[tokio::test]
async fn outflow_leaves_average_unchanged() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;

    seed_intake(&app, &variant, &store, dec!(10), dec!(1000)).await;
    let draft = MovementDraft::new(
        variant.id,
        store.id,
        MovementType::OrderItemConsumption,
        dec!(-4),
        None,
        None,
    );
    let record = app.services.ledger.append(draft).await.unwrap();

    assert_eq!(record.quantity, dec!(-4));
    assert_eq!(record.value, dec!(-400));
    assert_eq!(record.new_total_quantity, dec!(6));
    assert_eq!(record.new_average_value, dec!(100));
}

#[tokio::test]
async fn append_rejects_insufficient_stock_without_effect() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;

    seed_intake(&app, &variant, &store, dec!(15), dec!(1500)).await;

    let draft = MovementDraft::new(
        variant.id,
        store.id,
        MovementType::OrderItemConsumption,
        dec!(-20),
        None,
        None,
    );
    let err = app.services.ledger.append(draft).await.unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let key = BalanceKey::new(store.id, variant.id);
    let balance = app
        .services
        .projector
        .get_balance(app.db.as_ref(), key)
        .await
        .unwrap();
    assert_eq!(balance.total_quantity, dec!(15));
    assert_eq!(balance.last_sequence, 1);
}

#[tokio::test]
async fn snapshot_chain_is_contiguous_per_key() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;

    seed_intake(&app, &variant, &store, dec!(10), dec!(1000)).await;
    seed_intake(&app, &variant, &store, dec!(5), dec!(600)).await;
    let consume = MovementDraft::new(
        variant.id,
        store.id,
        MovementType::OrderItemConsumption,
        dec!(-3),
        None,
        None,
    );
    app.services.ledger.append(consume).await.unwrap();

    let records = movement_record::Entity::find()
        .filter(movement_record::Column::VariantId.eq(variant.id))
        .filter(movement_record::Column::LocationId.eq(store.id))
        .order_by_asc(movement_record::Column::Sequence)
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(records.len(), 3);

    let mut previous_quantity = Decimal::ZERO;
    let mut previous_average = Decimal::ZERO;
    for (index, record) in records.iter().enumerate() {
        assert_eq!(record.sequence, index as i64 + 1);
        assert_eq!(record.previous_total_quantity, previous_quantity);
        assert_eq!(record.previous_average_value, previous_average);
        assert_eq!(
            record.new_total_quantity,
            record.previous_total_quantity + record.quantity
        );
        previous_quantity = record.new_total_quantity;
        previous_average = record.new_average_value;
    }
}

#[tokio::test]
async fn recompute_agrees_with_incremental_cache() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;

    seed_intake(&app, &variant, &store, dec!(10), dec!(1000)).await;
    seed_intake(&app, &variant, &store, dec!(7), dec!(910)).await;
    let consume = MovementDraft::new(
        variant.id,
        store.id,
        MovementType::OrderItemConsumption,
        dec!(-6),
        None,
        None,
    );
    app.services.ledger.append(consume).await.unwrap();

    let key = BalanceKey::new(store.id, variant.id);
    let audit = app
        .services
        .projector
        .audit(app.db.as_ref(), key)
        .await
        .unwrap();
    assert!(audit.consistent, "cache diverged from full fold: {:?}", audit);

    let cached = app
        .services
        .projector
        .get_balance(app.db.as_ref(), key)
        .await
        .unwrap();
    let recomputed = app
        .services
        .projector
        .recompute(app.db.as_ref(), key)
        .await
        .unwrap();
    assert_eq!(cached, recomputed);
}

#[tokio::test]
async fn sequences_are_scoped_per_key() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store_a = seed_store(&app, "Downtown").await;
    let store_b = seed_store(&app, "Uptown").await;

    seed_intake(&app, &variant, &store_a, dec!(3), dec!(30)).await;
    seed_intake(&app, &variant, &store_b, dec!(4), dec!(40)).await;
    seed_intake(&app, &variant, &store_a, dec!(5), dec!(50)).await;

    let key_a = BalanceKey::new(store_a.id, variant.id);
    let key_b = BalanceKey::new(store_b.id, variant.id);
    let balance_a = app
        .services
        .projector
        .get_balance(app.db.as_ref(), key_a)
        .await
        .unwrap();
    let balance_b = app
        .services
        .projector
        .get_balance(app.db.as_ref(), key_b)
        .await
        .unwrap();
    assert_eq!(balance_a.last_sequence, 2);
    assert_eq!(balance_b.last_sequence, 1);
}

#[tokio::test]
async fn append_validates_input_and_references() {
    let app = setup().await;
    let variant = seed_variant(&app).await;
    let store = seed_store(&app, "Downtown").await;

    // Zero quantity never reaches the ledger.
    let zero = MovementDraft::new(
        variant.id,
        store.id,
        MovementType::Modification,
        dec!(0),
        None,
        None,
    );
    assert!(matches!(
        app.services.ledger.append(zero).await.unwrap_err(),
        ServiceError::Validation(_)
    ));

    // Unknown variant and unknown location are NotFound.
    let unknown_variant = MovementDraft::new(
        Uuid::new_v4(),
        store.id,
        MovementType::Intake,
        dec!(1),
        Some(dec!(10)),
        None,
    );
    assert!(matches!(
        app.services.ledger.append(unknown_variant).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));

    let unknown_location = MovementDraft::new(
        variant.id,
        Uuid::new_v4(),
        MovementType::Intake,
        dec!(1),
        Some(dec!(10)),
        None,
    );
    assert!(matches!(
        app.services.ledger.append(unknown_location).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}
