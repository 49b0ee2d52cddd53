use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::movement_record::{self, Entity as MovementRecords, MovementType, ReferenceType};
use crate::entities::{location, stock_variant};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::key_lock::{BalanceKey, KeyLocks};
use crate::services::balances::{Balance, BalanceProjector};

/// Scale of every stored quantity, value, and average.
pub const VALUE_SCALE: u32 = 4;

/// Bounded transparent retries on optimistic-concurrency conflicts.
const MAX_CONFLICT_RETRIES: usize = 3;

/// A movement to be appended. `id` is assigned up front so producers can
/// reference the record they are about to emit.
#[derive(Debug, Clone)]
pub struct MovementDraft {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub location_id: Uuid,
    pub movement_type: MovementType,
    /// Signed quantity delta; never zero.
    pub quantity: Decimal,
    /// Signed monetary delta. `None` values the movement at the running
    /// average of the balance it lands on.
    pub value: Option<Decimal>,
    pub reference: Option<(ReferenceType, Uuid)>,
}

impl MovementDraft {
    pub fn new(
        variant_id: Uuid,
        location_id: Uuid,
        movement_type: MovementType,
        quantity: Decimal,
        value: Option<Decimal>,
        reference: Option<(ReferenceType, Uuid)>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            variant_id,
            location_id,
            movement_type,
            quantity,
            value,
            reference,
        }
    }

    pub fn key(&self) -> BalanceKey {
        BalanceKey::new(self.location_id, self.variant_id)
    }
}

/// Filters for the read-side movement listing.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub location_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

fn noop_follow_up(_txn: &DatabaseTransaction) -> BoxFuture<'_, Result<(), ServiceError>> {
    Box::pin(async { Ok(()) })
}

/// Movement Ledger: the append-only source of truth.
///
/// Appends validate against the projected balance, compute the
/// before/after weighted-average snapshot, and assign the per-key
/// sequence number, all inside one database transaction per workflow
/// operation. Multi-record workflows commit all records or none.
#[derive(Clone)]
pub struct LedgerService {
    db: Arc<DbPool>,
    projector: Arc<BalanceProjector>,
    locks: Arc<KeyLocks>,
    event_sender: EventSender,
}

impl LedgerService {
    pub fn new(
        db: Arc<DbPool>,
        projector: Arc<BalanceProjector>,
        locks: Arc<KeyLocks>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            projector,
            locks,
            event_sender,
        }
    }

    pub fn projector(&self) -> &Arc<BalanceProjector> {
        &self.projector
    }

    /// Appends a single movement.
    #[instrument(skip(self))]
    pub async fn append(
        &self,
        draft: MovementDraft,
    ) -> Result<movement_record::Model, ServiceError> {
        let mut records = self.append_all(vec![draft]).await?;
        records
            .pop()
            .ok_or_else(|| ServiceError::Internal("append produced no record".to_string()))
    }

    /// Appends a batch of movements atomically.
    pub async fn append_all(
        &self,
        drafts: Vec<MovementDraft>,
    ) -> Result<Vec<movement_record::Model>, ServiceError> {
        self.append_all_with(drafts, noop_follow_up).await
    }

    /// Appends a batch of movements atomically, running `follow_up`
    /// (typically the producing workflow's state transition) inside the
    /// same transaction. If any append or the follow-up fails, nothing
    /// is persisted.
    ///
    /// Serialization: all distinct (location, variant) keys are locked
    /// in canonical order for the duration. A unique-index violation on
    /// the per-key sequence (another process appended concurrently) is
    /// retried transparently up to [`MAX_CONFLICT_RETRIES`] times.
    pub async fn append_all_with<F>(
        &self,
        drafts: Vec<MovementDraft>,
        follow_up: F,
    ) -> Result<Vec<movement_record::Model>, ServiceError>
    where
        F: for<'c> Fn(&'c DatabaseTransaction) -> BoxFuture<'c, Result<(), ServiceError>>
            + Send
            + Sync,
    {
        if drafts.is_empty() {
            return Err(ServiceError::Validation(
                "a ledger append requires at least one movement".to_string(),
            ));
        }
        for draft in &drafts {
            validate_draft(draft)?;
        }

        let keys: Vec<BalanceKey> = drafts.iter().map(MovementDraft::key).collect();
        let _guards = self.locks.acquire_all(&keys).await;

        let mut attempt = 0;
        loop {
            match self.try_append(&drafts, &follow_up).await {
                Err(err) if err.is_retryable() && attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    warn!(attempt, "ledger append conflict, retrying");
                    for key in &keys {
                        self.projector.invalidate(*key);
                    }
                }
                other => return other,
            }
        }
    }

    async fn try_append<F>(
        &self,
        drafts: &[MovementDraft],
        follow_up: &F,
    ) -> Result<Vec<movement_record::Model>, ServiceError>
    where
        F: for<'c> Fn(&'c DatabaseTransaction) -> BoxFuture<'c, Result<(), ServiceError>>
            + Send
            + Sync,
    {
        let txn = self.db.begin().await?;

        let stock_by_variant = self.resolve_variants(&txn, drafts).await?;
        self.check_locations(&txn, drafts).await?;

        // Working view of every balance this batch touches; records
        // later in the batch see the effect of earlier ones.
        let mut working: HashMap<BalanceKey, Balance> = HashMap::new();
        let mut records = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let key = draft.key();
            let current = match working.get(&key) {
                Some(balance) => *balance,
                None => self.projector.get_balance(&txn, key).await?,
            };

            let quantity = draft.quantity.round_dp(VALUE_SCALE);
            let value = match draft.value {
                Some(value) => value.round_dp(VALUE_SCALE),
                None => (current.average_value * quantity).round_dp(VALUE_SCALE),
            };
            if value != Decimal::ZERO && value.is_sign_positive() != quantity.is_sign_positive() {
                return Err(ServiceError::Validation(
                    "movement value must carry the same sign as its quantity".to_string(),
                ));
            }

            let next = current.apply(quantity, value, current.last_sequence + 1);
            if next.total_quantity < Decimal::ZERO {
                return Err(ServiceError::InsufficientStock(format!(
                    "movement of {} would drive balance {} at location {} below zero (current {})",
                    quantity, draft.variant_id, draft.location_id, current.total_quantity
                )));
            }

            let model = movement_record::ActiveModel {
                id: Set(draft.id),
                stock_id: Set(stock_by_variant[&draft.variant_id]),
                variant_id: Set(draft.variant_id),
                location_id: Set(draft.location_id),
                movement_type: Set(draft.movement_type.to_string()),
                quantity: Set(quantity),
                value: Set(value),
                previous_total_quantity: Set(current.total_quantity),
                previous_average_value: Set(current.average_value),
                new_total_quantity: Set(next.total_quantity),
                new_average_value: Set(next.average_value),
                sequence: Set(next.last_sequence),
                reference_type: Set(draft.reference.map(|(kind, _)| kind.to_string())),
                reference_id: Set(draft.reference.map(|(_, id)| id)),
                created_at: Set(Utc::now()),
            };
            let record = model.insert(&txn).await.map_err(map_append_err)?;

            working.insert(key, next);
            records.push(record);
        }

        follow_up(&txn).await?;
        txn.commit().await.map_err(map_append_err)?;

        for (key, balance) in &working {
            self.projector.store(*key, *balance);
        }
        for record in &records {
            let event = Event::MovementAppended {
                movement_id: record.id,
                location_id: record.location_id,
                variant_id: record.variant_id,
                movement_type: record.movement_type.clone(),
                quantity: record.quantity,
                new_total_quantity: record.new_total_quantity,
            };
            // The records are committed; a dead event channel is logged,
            // not surfaced as an operation failure.
            if let Err(err) = self.event_sender.send(event).await {
                warn!("failed to publish movement event: {}", err);
            }
        }

        Ok(records)
    }

    async fn resolve_variants(
        &self,
        txn: &DatabaseTransaction,
        drafts: &[MovementDraft],
    ) -> Result<HashMap<Uuid, Uuid>, ServiceError> {
        let mut stock_by_variant = HashMap::new();
        for draft in drafts {
            if stock_by_variant.contains_key(&draft.variant_id) {
                continue;
            }
            let variant = stock_variant::Entity::find_by_id(draft.variant_id)
                .one(txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("stock variant {} not found", draft.variant_id))
                })?;
            stock_by_variant.insert(variant.id, variant.stock_id);
        }
        Ok(stock_by_variant)
    }

    async fn check_locations(
        &self,
        txn: &DatabaseTransaction,
        drafts: &[MovementDraft],
    ) -> Result<(), ServiceError> {
        let mut seen = Vec::new();
        for draft in drafts {
            if seen.contains(&draft.location_id) {
                continue;
            }
            location::Entity::find_by_id(draft.location_id)
                .one(txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("location {} not found", draft.location_id))
                })?;
            seen.push(draft.location_id);
        }
        Ok(())
    }

    /// Paginated read of the ledger, newest first.
    pub async fn list(
        &self,
        filter: MovementFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<movement_record::Model>, u64), ServiceError> {
        let mut query = MovementRecords::find();
        if let Some(location_id) = filter.location_id {
            query = query.filter(movement_record::Column::LocationId.eq(location_id));
        }
        if let Some(variant_id) = filter.variant_id {
            query = query.filter(movement_record::Column::VariantId.eq(variant_id));
        }
        if let Some(movement_type) = filter.movement_type {
            query = query.filter(movement_record::Column::MovementType.eq(movement_type.to_string()));
        }
        if let Some(from) = filter.from {
            query = query.filter(movement_record::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(movement_record::Column::CreatedAt.lte(to));
        }

        let paginator = query
            .order_by_desc(movement_record::Column::CreatedAt)
            .order_by_desc(movement_record::Column::Sequence)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((records, total))
    }
}

fn validate_draft(draft: &MovementDraft) -> Result<(), ServiceError> {
    if draft.quantity.is_zero() {
        return Err(ServiceError::Validation(
            "movement quantity must be non-zero".to_string(),
        ));
    }
    let expects_positive = matches!(
        draft.movement_type,
        MovementType::Intake | MovementType::TransferIn
    );
    let expects_negative = matches!(
        draft.movement_type,
        MovementType::OrderItemConsumption | MovementType::TransferOut
    );
    if expects_positive && draft.quantity < Decimal::ZERO {
        return Err(ServiceError::Validation(format!(
            "{} movements require a positive quantity",
            draft.movement_type
        )));
    }
    if expects_negative && draft.quantity > Decimal::ZERO {
        return Err(ServiceError::Validation(format!(
            "{} movements require a negative quantity",
            draft.movement_type
        )));
    }
    Ok(())
}

fn map_append_err(err: sea_orm::DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => ServiceError::Conflict(format!(
            "concurrent append on the same (location, variant) detected: {}",
            detail
        )),
        _ => ServiceError::Database(err),
    }
}
