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
use crate::entities::stock_request::{self, ApprovalStatus, Entity as StockRequests};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::key_lock::BalanceKey;
use crate::services::catalog::CatalogService;
use crate::services::ledger::{LedgerService, MovementDraft, VALUE_SCALE};

#[derive(Debug, Clone)]
pub struct CreateStockRequest {
    pub variant_id: Uuid,
    /// Source warehouse; must be a WAREHOUSE location.
    pub warehouse_id: Uuid,
    /// Requesting destination location.
    pub location_id: Uuid,
    pub quantity: Decimal,
    pub value: Option<Decimal>,
    pub requested_by: Uuid,
}

/// Warehouse stock request workflow: the warehouse-to-location analogue
/// of a transfer. Approval moves stock out of the warehouse and into
/// the requesting location atomically.
#[derive(Clone)]
pub struct StockRequestService {
    db: Arc<DbPool>,
    ledger: LedgerService,
    catalog: CatalogService,
    event_sender: EventSender,
}

impl StockRequestService {
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
    pub async fn create(
        &self,
        input: CreateStockRequest,
    ) -> Result<stock_request::Model, ServiceError> {
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "requested quantity must be positive".to_string(),
            ));
        }
        if input.warehouse_id == input.location_id {
            return Err(ServiceError::Validation(
                "request source and destination must differ".to_string(),
            ));
        }
        if let Some(value) = input.value {
            if value < Decimal::ZERO {
                return Err(ServiceError::Validation(
                    "request value must not be negative".to_string(),
                ));
            }
        }
        self.catalog.get_variant(input.variant_id).await?;
        self.catalog.get_location(input.location_id).await?;
        let warehouse = self.catalog.get_location(input.warehouse_id).await?;
        if !warehouse.is_warehouse() {
            return Err(ServiceError::Validation(format!(
                "location {} is not a warehouse",
                input.warehouse_id
            )));
        }

        let model = stock_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            variant_id: Set(input.variant_id),
            warehouse_id: Set(input.warehouse_id),
            location_id: Set(input.location_id),
            quantity: Set(input.quantity.round_dp(VALUE_SCALE)),
            value: Set(input.value.map(|v| v.round_dp(VALUE_SCALE))),
            status: Set(ApprovalStatus::Pending.to_string()),
            requested_by: Set(input.requested_by),
            approved_by: Set(None),
            approved_date: Set(None),
            cancelled_at: Set(None),
            version: Set(1),
            created_at: Set(Utc::now()),
        };
        let request = model.insert(self.db.as_ref()).await?;

        if let Err(err) = self
            .event_sender
            .send(Event::StockRequestCreated(request.id))
            .await
        {
            warn!("failed to publish stock request event: {}", err);
        }
        Ok(request)
    }

    /// Approves a PENDING request, moving stock out of the warehouse
    /// and into the requesting location in one transaction.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        id: Uuid,
        approved_by: Uuid,
    ) -> Result<stock_request::Model, ServiceError> {
        let request = self.find(id).await?;
        match request.status() {
            Some(ApprovalStatus::Pending) => {}
            Some(other) => {
                return Err(ServiceError::InvalidStateTransition(format!(
                    "stock request {} is {}, only PENDING requests can be approved",
                    id, other
                )))
            }
            None => {
                return Err(ServiceError::Internal(format!(
                    "stock request {} carries unknown status {}",
                    id, request.status
                )))
            }
        }
        if approved_by == request.requested_by {
            return Err(ServiceError::Validation(
                "a stock request must be approved by someone other than its requester".to_string(),
            ));
        }

        let value = match request.value {
            Some(value) => value,
            None => {
                let key = BalanceKey::new(request.warehouse_id, request.variant_id);
                let balance = self
                    .ledger
                    .projector()
                    .get_balance(self.db.as_ref(), key)
                    .await?;
                (balance.average_value * request.quantity).round_dp(VALUE_SCALE)
            }
        };

        let drafts = vec![
            MovementDraft::new(
                request.variant_id,
                request.warehouse_id,
                MovementType::TransferOut,
                -request.quantity,
                Some(-value),
                Some((ReferenceType::StockRequest, id)),
            ),
            MovementDraft::new(
                request.variant_id,
                request.location_id,
                MovementType::TransferIn,
                request.quantity,
                Some(value),
                Some((ReferenceType::StockRequest, id)),
            ),
        ];

        let approved_date = Utc::now();
        self.ledger
            .append_all_with(drafts, move |txn| {
                Box::pin(async move {
                    let result = StockRequests::update_many()
                        .col_expr(
                            stock_request::Column::Status,
                            Expr::value(ApprovalStatus::Approved.to_string()),
                        )
                        .col_expr(stock_request::Column::Value, Expr::value(value))
                        .col_expr(stock_request::Column::ApprovedBy, Expr::value(approved_by))
                        .col_expr(
                            stock_request::Column::ApprovedDate,
                            Expr::value(approved_date),
                        )
                        .col_expr(
                            stock_request::Column::Version,
                            Expr::col(stock_request::Column::Version).add(1),
                        )
                        .filter(stock_request::Column::Id.eq(id))
                        .filter(
                            stock_request::Column::Status
                                .eq(ApprovalStatus::Pending.to_string()),
                        )
                        .exec(txn)
                        .await?;
                    if result.rows_affected != 1 {
                        return Err(ServiceError::InvalidStateTransition(format!(
                            "stock request {} left PENDING concurrently",
                            id
                        )));
                    }
                    Ok(())
                })
            })
            .await?;

        if let Err(err) = self.event_sender.send(Event::StockRequestApproved(id)).await {
            warn!("failed to publish stock request event: {}", err);
        }
        self.find(id).await
    }

    /// Cancels a PENDING request. Terminal; no ledger effect.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: Uuid) -> Result<stock_request::Model, ServiceError> {
        let request = self.find(id).await?;
        match request.status() {
            Some(ApprovalStatus::Pending) => {}
            Some(other) => {
                return Err(ServiceError::InvalidStateTransition(format!(
                    "stock request {} is {}, only PENDING requests can be cancelled",
                    id, other
                )))
            }
            None => {
                return Err(ServiceError::Internal(format!(
                    "stock request {} carries unknown status {}",
                    id, request.status
                )))
            }
        }

        let result = StockRequests::update_many()
            .col_expr(
                stock_request::Column::Status,
                Expr::value(ApprovalStatus::Cancelled.to_string()),
            )
            .col_expr(stock_request::Column::CancelledAt, Expr::value(Utc::now()))
            .col_expr(
                stock_request::Column::Version,
                Expr::col(stock_request::Column::Version).add(1),
            )
            .filter(stock_request::Column::Id.eq(id))
            .filter(stock_request::Column::Status.eq(ApprovalStatus::Pending.to_string()))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected != 1 {
            return Err(ServiceError::InvalidStateTransition(format!(
                "stock request {} left PENDING concurrently",
                id
            )));
        }

        if let Err(err) = self
            .event_sender
            .send(Event::StockRequestCancelled(id))
            .await
        {
            warn!("failed to publish stock request event: {}", err);
        }
        self.find(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<stock_request::Model, ServiceError> {
        self.find(id).await
    }

    pub async fn list(
        &self,
        status: Option<ApprovalStatus>,
        warehouse_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_request::Model>, u64), ServiceError> {
        let mut query = StockRequests::find();
        if let Some(status) = status {
            query = query.filter(stock_request::Column::Status.eq(status.to_string()));
        }
        if let Some(warehouse_id) = warehouse_id {
            query = query.filter(stock_request::Column::WarehouseId.eq(warehouse_id));
        }
        let paginator = query
            .order_by_desc(stock_request::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn find(&self, id: Uuid) -> Result<stock_request::Model, ServiceError> {
        StockRequests::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("stock request {} not found", id)))
    }
}
