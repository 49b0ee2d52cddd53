use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::movement_record::{MovementType, ReferenceType};
use crate::entities::stock_modification::{self, Entity as StockModifications, ModificationReason};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::key_lock::BalanceKey;
use crate::services::ledger::{LedgerService, MovementDraft, VALUE_SCALE};

#[derive(Debug, Clone)]
pub struct CreateModification {
    pub variant_id: Uuid,
    pub location_id: Uuid,
    /// Signed quantity delta; never zero.
    pub quantity: Decimal,
    /// Omitted values are resolved from the running average.
    pub value: Option<Decimal>,
    pub reason: ModificationReason,
    pub staff_id: Uuid,
    pub comment: Option<String>,
}

/// Stateless stock corrections: creation emits the MODIFICATION
/// movement immediately and is final. There is no approval step.
#[derive(Clone)]
pub struct ModificationService {
    db: Arc<DbPool>,
    ledger: LedgerService,
    event_sender: EventSender,
}

impl ModificationService {
    pub fn new(db: Arc<DbPool>, ledger: LedgerService, event_sender: EventSender) -> Self {
        Self {
            db,
            ledger,
            event_sender,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CreateModification,
    ) -> Result<stock_modification::Model, ServiceError> {
        if input.quantity.is_zero() {
            return Err(ServiceError::Validation(
                "modification quantity must be non-zero".to_string(),
            ));
        }

        let quantity = input.quantity.round_dp(VALUE_SCALE);
        let value = match input.value {
            Some(value) => value.round_dp(VALUE_SCALE),
            None => {
                let key = BalanceKey::new(input.location_id, input.variant_id);
                let balance = self
                    .ledger
                    .projector()
                    .get_balance(self.db.as_ref(), key)
                    .await?;
                (balance.average_value * quantity).round_dp(VALUE_SCALE)
            }
        };

        let modification_id = Uuid::new_v4();
        let draft = MovementDraft::new(
            input.variant_id,
            input.location_id,
            MovementType::Modification,
            quantity,
            Some(value),
            Some((ReferenceType::Modification, modification_id)),
        );
        let movement_id = draft.id;

        let reason = input.reason;
        let staff_id = input.staff_id;
        let comment = input.comment.clone();
        let variant_id = input.variant_id;
        let location_id = input.location_id;

        self.ledger
            .append_all_with(vec![draft], move |txn| {
                let comment = comment.clone();
                Box::pin(async move {
                    let row = stock_modification::ActiveModel {
                        id: Set(modification_id),
                        variant_id: Set(variant_id),
                        location_id: Set(location_id),
                        quantity: Set(quantity),
                        value: Set(value),
                        reason: Set(reason.to_string()),
                        staff_id: Set(staff_id),
                        comment: Set(comment),
                        movement_id: Set(movement_id),
                        created_at: Set(Utc::now()),
                    };
                    row.insert(txn).await?;
                    Ok(())
                })
            })
            .await?;

        if let Err(err) = self
            .event_sender
            .send(Event::ModificationRecorded(modification_id))
            .await
        {
            warn!("failed to publish modification event: {}", err);
        }

        self.get(modification_id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<stock_modification::Model, ServiceError> {
        StockModifications::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("modification {} not found", id)))
    }

    pub async fn list(
        &self,
        variant_id: Option<Uuid>,
        location_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_modification::Model>, u64), ServiceError> {
        let mut query = StockModifications::find();
        if let Some(variant_id) = variant_id {
            query = query.filter(stock_modification::Column::VariantId.eq(variant_id));
        }
        if let Some(location_id) = location_id {
            query = query.filter(stock_modification::Column::LocationId.eq(location_id));
        }
        let paginator = query
            .order_by_desc(stock_modification::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}
