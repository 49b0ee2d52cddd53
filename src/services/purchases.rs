use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::movement_record::{MovementType, ReferenceType};
use crate::entities::purchase_line_item::{self, Entity as PurchaseLineItems};
use crate::entities::stock_intake_purchase::{
    self, Entity as StockIntakePurchases, PaymentStatus, PurchaseStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::catalog::CatalogService;
use crate::services::ledger::{LedgerService, MovementDraft, VALUE_SCALE};

/// One ordered line of a new purchase.
#[derive(Debug, Clone)]
pub struct PurchaseLineInput {
    pub variant_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreatePurchase {
    pub supplier_id: Uuid,
    pub location_id: Uuid,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub lines: Vec<PurchaseLineInput>,
}

/// Purchase together with its ordered lines.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseDetails {
    #[serde(flatten)]
    pub purchase: stock_intake_purchase::Model,
    pub lines: Vec<purchase_line_item::Model>,
    pub unpaid_amount: Decimal,
}

impl PurchaseDetails {
    fn new(purchase: stock_intake_purchase::Model, lines: Vec<purchase_line_item::Model>) -> Self {
        let unpaid_amount = purchase.unpaid_amount();
        Self {
            purchase,
            lines,
            unpaid_amount,
        }
    }
}

/// Intake purchase workflow: DRAFT until delivery confirmation, which
/// emits one INTAKE movement per line; the payment sub-state moves
/// independently and never touches the ledger.
#[derive(Clone)]
pub struct PurchaseService {
    db: Arc<DbPool>,
    ledger: LedgerService,
    catalog: CatalogService,
    event_sender: EventSender,
}

impl PurchaseService {
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
    pub async fn create(&self, input: CreatePurchase) -> Result<PurchaseDetails, ServiceError> {
        if input.lines.is_empty() {
            return Err(ServiceError::Validation(
                "a purchase requires at least one line item".to_string(),
            ));
        }
        for line in &input.lines {
            if line.quantity <= Decimal::ZERO {
                return Err(ServiceError::Validation(
                    "line quantities must be positive".to_string(),
                ));
            }
            if line.unit_cost < Decimal::ZERO {
                return Err(ServiceError::Validation(
                    "line unit costs must not be negative".to_string(),
                ));
            }
        }

        self.catalog.get_supplier(input.supplier_id).await?;
        self.catalog.get_location(input.location_id).await?;

        let purchase_id = Uuid::new_v4();
        let mut total_cost = Decimal::ZERO;
        let mut line_models = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let variant = self.catalog.get_variant(line.variant_id).await?;
            let quantity = line.quantity.round_dp(VALUE_SCALE);
            let unit_cost = line.unit_cost.round_dp(VALUE_SCALE);
            let line_cost = (quantity * unit_cost).round_dp(VALUE_SCALE);
            total_cost += line_cost;
            line_models.push(purchase_line_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_id: Set(purchase_id),
                stock_id: Set(variant.stock_id),
                variant_id: Set(variant.id),
                quantity: Set(quantity),
                unit_cost: Set(unit_cost),
                line_cost: Set(line_cost),
            });
        }

        let txn = self.db.begin().await?;
        let purchase = stock_intake_purchase::ActiveModel {
            id: Set(purchase_id),
            supplier_id: Set(input.supplier_id),
            location_id: Set(input.location_id),
            status: Set(PurchaseStatus::Draft.to_string()),
            payment_status: Set(PaymentStatus::Unpaid.to_string()),
            total_cost: Set(total_cost),
            paid_amount: Set(Decimal::ZERO),
            delivery_date: Set(input.delivery_date),
            notes: Set(input.notes),
            received_at: Set(None),
            version: Set(1),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;
        for line in line_models {
            line.insert(&txn).await?;
        }
        txn.commit().await?;

        if let Err(err) = self.event_sender.send(Event::PurchaseCreated(purchase_id)).await {
            warn!("failed to publish purchase event: {}", err);
        }

        let lines = self.lines_of(purchase_id).await?;
        Ok(PurchaseDetails::new(purchase, lines))
    }

    /// Confirms delivery: DRAFT → RECEIVED, appending one INTAKE per
    /// line in the same transaction. Confirming an already-RECEIVED
    /// purchase is a no-op, not an error.
    #[instrument(skip(self))]
    pub async fn confirm_delivery(&self, id: Uuid) -> Result<PurchaseDetails, ServiceError> {
        let purchase = self.find(id).await?;
        match purchase.status() {
            Some(PurchaseStatus::Received) => {
                let lines = self.lines_of(id).await?;
                return Ok(PurchaseDetails::new(purchase, lines));
            }
            Some(PurchaseStatus::Draft) => {}
            None => {
                return Err(ServiceError::Internal(format!(
                    "purchase {} carries unknown status {}",
                    id, purchase.status
                )))
            }
        }

        let lines = self.lines_of(id).await?;
        let drafts: Vec<MovementDraft> = lines
            .iter()
            .map(|line| {
                MovementDraft::new(
                    line.variant_id,
                    purchase.location_id,
                    MovementType::Intake,
                    line.quantity,
                    Some(line.line_cost),
                    Some((ReferenceType::Purchase, id)),
                )
            })
            .collect();

        let received_at = Utc::now();
        self.ledger
            .append_all_with(drafts, move |txn| {
                Box::pin(async move {
                    let result = StockIntakePurchases::update_many()
                        .col_expr(
                            stock_intake_purchase::Column::Status,
                            Expr::value(PurchaseStatus::Received.to_string()),
                        )
                        .col_expr(
                            stock_intake_purchase::Column::ReceivedAt,
                            Expr::value(received_at),
                        )
                        .col_expr(
                            stock_intake_purchase::Column::UpdatedAt,
                            Expr::value(received_at),
                        )
                        .col_expr(
                            stock_intake_purchase::Column::Version,
                            Expr::col(stock_intake_purchase::Column::Version).add(1),
                        )
                        .filter(stock_intake_purchase::Column::Id.eq(id))
                        .filter(
                            stock_intake_purchase::Column::Status
                                .eq(PurchaseStatus::Draft.to_string()),
                        )
                        .exec(txn)
                        .await?;
                    if result.rows_affected != 1 {
                        return Err(ServiceError::Conflict(format!(
                            "purchase {} was confirmed concurrently",
                            id
                        )));
                    }
                    Ok(())
                })
            })
            .await?;

        if let Err(err) = self.event_sender.send(Event::PurchaseReceived(id)).await {
            warn!("failed to publish purchase event: {}", err);
        }

        let purchase = self.find(id).await?;
        let lines = self.lines_of(id).await?;
        Ok(PurchaseDetails::new(purchase, lines))
    }

    /// Records a payment against the purchase. Payments are monotonic:
    /// the paid amount only grows and never exceeds the total cost.
    #[instrument(skip(self))]
    pub async fn record_payment(
        &self,
        id: Uuid,
        amount: Decimal,
    ) -> Result<PurchaseDetails, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "payment amount must be positive".to_string(),
            ));
        }
        let amount = amount.round_dp(VALUE_SCALE);

        let purchase = self.find(id).await?;
        if amount > purchase.unpaid_amount() {
            return Err(ServiceError::Validation(format!(
                "payment of {} exceeds unpaid amount {}",
                amount,
                purchase.unpaid_amount()
            )));
        }

        let new_paid = purchase.paid_amount + amount;
        let new_status = PaymentStatus::derive(new_paid, purchase.total_cost);
        let result = StockIntakePurchases::update_many()
            .col_expr(
                stock_intake_purchase::Column::PaidAmount,
                Expr::value(new_paid),
            )
            .col_expr(
                stock_intake_purchase::Column::PaymentStatus,
                Expr::value(new_status.to_string()),
            )
            .col_expr(
                stock_intake_purchase::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .col_expr(
                stock_intake_purchase::Column::Version,
                Expr::col(stock_intake_purchase::Column::Version).add(1),
            )
            .filter(stock_intake_purchase::Column::Id.eq(id))
            .filter(stock_intake_purchase::Column::Version.eq(purchase.version))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected != 1 {
            return Err(ServiceError::Conflict(format!(
                "purchase {} was modified concurrently; retry the payment",
                id
            )));
        }

        let event = Event::PurchasePaymentRecorded {
            purchase_id: id,
            amount,
            payment_status: new_status.to_string(),
        };
        if let Err(err) = self.event_sender.send(event).await {
            warn!("failed to publish payment event: {}", err);
        }

        let purchase = self.find(id).await?;
        let lines = self.lines_of(id).await?;
        Ok(PurchaseDetails::new(purchase, lines))
    }

    pub async fn get(&self, id: Uuid) -> Result<PurchaseDetails, ServiceError> {
        let purchase = self.find(id).await?;
        let lines = self.lines_of(id).await?;
        Ok(PurchaseDetails::new(purchase, lines))
    }

    pub async fn list(
        &self,
        supplier_id: Option<Uuid>,
        status: Option<PurchaseStatus>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_intake_purchase::Model>, u64), ServiceError> {
        let mut query = StockIntakePurchases::find();
        if let Some(supplier_id) = supplier_id {
            query = query.filter(stock_intake_purchase::Column::SupplierId.eq(supplier_id));
        }
        if let Some(status) = status {
            query = query.filter(stock_intake_purchase::Column::Status.eq(status.to_string()));
        }
        let paginator = query
            .order_by_desc(stock_intake_purchase::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn find(&self, id: Uuid) -> Result<stock_intake_purchase::Model, ServiceError> {
        StockIntakePurchases::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("purchase {} not found", id)))
    }

    async fn lines_of(&self, id: Uuid) -> Result<Vec<purchase_line_item::Model>, ServiceError> {
        Ok(PurchaseLineItems::find()
            .filter(purchase_line_item::Column::PurchaseId.eq(id))
            .all(self.db.as_ref())
            .await?)
    }
}
