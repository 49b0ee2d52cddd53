use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::movement_record::{MovementType, ReferenceType};
use crate::entities::stock_transfer::{self, ApprovalStatus, Entity as StockTransfers};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::catalog::CatalogService;
use crate::services::ledger::{LedgerService, MovementDraft, VALUE_SCALE};

#[derive(Debug, Clone)]
pub struct CreateTransfer {
    pub variant_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub quantity: Decimal,
    /// Omitted values are resolved from the source running average at
    /// approval time.
    pub value: Option<Decimal>,
    pub staff_id: Uuid,
    pub notes: Option<String>,
}

/// Inter-location transfer workflow: PENDING → APPROVED emits the
/// TRANSFER_OUT / TRANSFER_IN pair atomically; PENDING → CANCELLED has
/// no ledger effect. Both outcomes are terminal.
#[derive(Clone)]
pub struct TransferService {
    db: Arc<DbPool>,
    ledger: LedgerService,
    catalog: CatalogService,
    event_sender: EventSender,
}

impl TransferService {
    pub fn new(
        db: Arc<DbPool>,
        ledger: LedgerService,
        catalog: CatalogService,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            ledger,
            catalog,
            event_sender,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateTransfer) -> Result<stock_transfer::Model, ServiceError> {
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "transfer quantity must be positive".to_string(),
            ));
        }
        if input.from_location_id == input.to_location_id {
            return Err(ServiceError::Validation(
                "transfer source and destination must differ".to_string(),
            ));
        }
        if let Some(value) = input.value {
            if value < Decimal::ZERO {
                return Err(ServiceError::Validation(
                    "transfer value must not be negative".to_string(),
                ));
            }
        }
        self.catalog.get_variant(input.variant_id).await?;
        self.catalog.get_location(input.from_location_id).await?;
        self.catalog.get_location(input.to_location_id).await?;

        let model = stock_transfer::ActiveModel {
            id: Set(Uuid::new_v4()),
            variant_id: Set(input.variant_id),
            from_location_id: Set(input.from_location_id),
            to_location_id: Set(input.to_location_id),
            quantity: Set(input.quantity.round_dp(VALUE_SCALE)),
            value: Set(input.value.map(|v| v.round_dp(VALUE_SCALE))),
            status: Set(ApprovalStatus::Pending.to_string()),
            staff_id: Set(input.staff_id),
            approved_by: Set(None),
            approved_at: Set(None),
            cancelled_at: Set(None),
            notes: Set(input.notes),
            version: Set(1),
            created_at: Set(Utc::now()),
        };
        let transfer = model.insert(self.db.as_ref()).await?;

        if let Err(err) = self.event_sender.send(Event::TransferCreated(transfer.id)).await {
            warn!("failed to publish transfer event: {}", err);
        }
        Ok(transfer)
    }

    /// Approves a PENDING transfer, emitting both movement legs
    /// atomically. The approver must differ from the requesting staff
    /// member (policy hook at this boundary, not a ledger invariant).
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        id: Uuid,
        approved_by: Uuid,
    ) -> Result<stock_transfer::Model, ServiceError> {
        let transfer = self.find(id).await?;
        match transfer.status() {
            Some(ApprovalStatus::Pending) => {}
            Some(other) => {
                return Err(ServiceError::InvalidStateTransition(format!(
                    "transfer {} is {}, only PENDING transfers can be approved",
                    id, other
                )))
            }
            None => {
                return Err(ServiceError::Internal(format!(
                    "transfer {} carries unknown status {}",
                    id, transfer.status
                )))
            }
        }
        if approved_by == transfer.staff_id {
            return Err(ServiceError::Validation(
                "a transfer must be approved by someone other than its requester".to_string(),
            ));
        }

        // Resolve the monetary value: explicit on the entity, or the
        // source balance's running average at approval time.
        let value = match transfer.value {
            Some(value) => value,
            None => {
                let key = crate::key_lock::BalanceKey::new(
                    transfer.from_location_id,
                    transfer.variant_id,
                );
                let balance = self
                    .ledger
                    .projector()
                    .get_balance(self.db.as_ref(), key)
                    .await?;
                (balance.average_value * transfer.quantity).round_dp(VALUE_SCALE)
            }
        };

        let drafts = vec![
            MovementDraft::new(
                transfer.variant_id,
                transfer.from_location_id,
                MovementType::TransferOut,
                -transfer.quantity,
                Some(-value),
                Some((ReferenceType::Transfer, id)),
            ),
            MovementDraft::new(
                transfer.variant_id,
                transfer.to_location_id,
                MovementType::TransferIn,
                transfer.quantity,
                Some(value),
                Some((ReferenceType::Transfer, id)),
            ),
        ];

        let approved_at = Utc::now();
        self.ledger
            .append_all_with(drafts, move |txn| {
                Box::pin(async move {
                    let result = StockTransfers::update_many()
                        .col_expr(
                            stock_transfer::Column::Status,
                            Expr::value(ApprovalStatus::Approved.to_string()),
                        )
                        .col_expr(stock_transfer::Column::Value, Expr::value(value))
                        .col_expr(stock_transfer::Column::ApprovedBy, Expr::value(approved_by))
                        .col_expr(stock_transfer::Column::ApprovedAt, Expr::value(approved_at))
                        .col_expr(
                            stock_transfer::Column::Version,
                            Expr::col(stock_transfer::Column::Version).add(1),
                        )
                        .filter(stock_transfer::Column::Id.eq(id))
                        .filter(
                            stock_transfer::Column::Status
                                .eq(ApprovalStatus::Pending.to_string()),
                        )
                        .exec(txn)
                        .await?;
                    if result.rows_affected != 1 {
                        // Lost a race on the same transfer: roll the
                        // appended legs back, ledger stays unchanged.
                        return Err(ServiceError::InvalidStateTransition(format!(
                            "transfer {} left PENDING concurrently",
                            id
                        )));
                    }
                    Ok(())
                })
            })
            .await?;

        if let Err(err) = self.event_sender.send(Event::TransferApproved(id)).await {
            warn!("failed to publish transfer event: {}", err);
        }
        self.find(id).await
    }

    /// Cancels a PENDING transfer. Terminal; no ledger effect exists or
    /// is created.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: Uuid) -> Result<stock_transfer::Model, ServiceError> {
        let transfer = self.find(id).await?;
        match transfer.status() {
            Some(ApprovalStatus::Pending) => {}
            Some(other) => {
                return Err(ServiceError::InvalidStateTransition(format!(
                    "transfer {} is {}, only PENDING transfers can be cancelled",
                    id, other
                )))
            }
            None => {
                return Err(ServiceError::Internal(format!(
                    "transfer {} carries unknown status {}",
                    id, transfer.status
                )))
            }
        }

        let result = StockTransfers::update_many()
            .col_expr(
                stock_transfer::Column::Status,
                Expr::value(ApprovalStatus::Cancelled.to_string()),
            )
            .col_expr(stock_transfer::Column::CancelledAt, Expr::value(Utc::now()))
            .col_expr(
                stock_transfer::Column::Version,
                Expr::col(stock_transfer::Column::Version).add(1),
            )
            .filter(stock_transfer::Column::Id.eq(id))
            .filter(stock_transfer::Column::Status.eq(ApprovalStatus::Pending.to_string()))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected != 1 {
            return Err(ServiceError::InvalidStateTransition(format!(
                "transfer {} left PENDING concurrently",
                id
            )));
        }

        if let Err(err) = self.event_sender.send(Event::TransferCancelled(id)).await {
            warn!("failed to publish transfer event: {}", err);
        }
        self.find(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<stock_transfer::Model, ServiceError> {
        self.find(id).await
    }

    pub async fn list(
        &self,
        status: Option<ApprovalStatus>,
        variant_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_transfer::Model>, u64), ServiceError> {
        let mut query = StockTransfers::find();
        if let Some(status) = status {
            query = query.filter(stock_transfer::Column::Status.eq(status.to_string()));
        }
        if let Some(variant_id) = variant_id {
            query = query.filter(stock_transfer::Column::VariantId.eq(variant_id));
        }
        let paginator = query
            .order_by_desc(stock_transfer::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn find(&self, id: Uuid) -> Result<stock_transfer::Model, ServiceError> {
        StockTransfers::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("transfer {} not found", id)))
    }
}
