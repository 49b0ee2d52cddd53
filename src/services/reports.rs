use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::movement_record::{self, Entity as MovementRecords};
use crate::entities::stock::{self, Entity as Stocks};
use crate::entities::stock_intake_purchase::{self, Entity as StockIntakePurchases};
use crate::entities::stock_request::{self, Entity as StockRequests};
use crate::entities::stock_transfer::{self, Entity as StockTransfers};
use crate::errors::ServiceError;
use crate::key_lock::BalanceKey;
use crate::services::balances::Balance;

/// Date-range scope shared by the reports.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MovementSummaryRow {
    pub movement_type: String,
    pub count: u64,
    pub quantity: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MovementSummaryReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub rows: Vec<MovementSummaryRow>,
    pub net_quantity: Decimal,
    pub net_value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseReportRow {
    pub payment_status: String,
    pub count: u64,
    pub total_cost: Decimal,
    pub paid_amount: Decimal,
    pub unpaid_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub rows: Vec<PurchaseReportRow>,
    pub received_count: u64,
    pub draft_count: u64,
    pub total_cost: Decimal,
    pub total_paid: Decimal,
    pub total_unpaid: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApprovalReportRow {
    pub status: String,
    pub transfer_count: u64,
    pub request_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApprovalReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub rows: Vec<ApprovalReportRow>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValuationRow {
    pub location_id: Uuid,
    pub variant_id: Uuid,
    pub total_quantity: Decimal,
    pub average_value: Decimal,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValuationReport {
    pub rows: Vec<ValuationRow>,
    pub total_value: Decimal,
}

/// Read-only aggregations over the ledger and the workflow entities.
/// Pure functions of persisted state: repeated calls with identical
/// arguments yield identical results.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Totals per movement type within the range, optionally scoped to
    /// one location and/or one stock category.
    #[instrument(skip(self))]
    pub async fn movement_summary(
        &self,
        range: DateRange,
        location_id: Option<Uuid>,
        category: Option<String>,
    ) -> Result<MovementSummaryReport, ServiceError> {
        let mut query = MovementRecords::find()
            .filter(movement_record::Column::CreatedAt.gte(range.from))
            .filter(movement_record::Column::CreatedAt.lte(range.to));
        if let Some(location_id) = location_id {
            query = query.filter(movement_record::Column::LocationId.eq(location_id));
        }
        let mut records = query.all(self.db.as_ref()).await?;

        if let Some(category) = category {
            let stocks = Stocks::find()
                .filter(stock::Column::Category.eq(category))
                .all(self.db.as_ref())
                .await?;
            let in_category: Vec<Uuid> = stocks.into_iter().map(|s| s.id).collect();
            records.retain(|r| in_category.contains(&r.stock_id));
        }

        let mut by_type: BTreeMap<String, MovementSummaryRow> = BTreeMap::new();
        let mut net_quantity = Decimal::ZERO;
        let mut net_value = Decimal::ZERO;
        for record in records {
            net_quantity += record.quantity;
            net_value += record.value;
            let row = by_type
                .entry(record.movement_type.clone())
                .or_insert_with(|| MovementSummaryRow {
                    movement_type: record.movement_type.clone(),
                    count: 0,
                    quantity: Decimal::ZERO,
                    value: Decimal::ZERO,
                });
            row.count += 1;
            row.quantity += record.quantity;
            row.value += record.value;
        }

        Ok(MovementSummaryReport {
            from: range.from,
            to: range.to,
            rows: by_type.into_values().collect(),
            net_quantity,
            net_value,
        })
    }

    /// Purchase totals and counts by payment status, optionally scoped
    /// to one supplier.
    #[instrument(skip(self))]
    pub async fn purchase_report(
        &self,
        range: DateRange,
        supplier_id: Option<Uuid>,
    ) -> Result<PurchaseReport, ServiceError> {
        let mut query = StockIntakePurchases::find()
            .filter(stock_intake_purchase::Column::CreatedAt.gte(range.from))
            .filter(stock_intake_purchase::Column::CreatedAt.lte(range.to));
        if let Some(supplier_id) = supplier_id {
            query = query.filter(stock_intake_purchase::Column::SupplierId.eq(supplier_id));
        }
        let purchases = query.all(self.db.as_ref()).await?;

        let mut by_status: BTreeMap<String, PurchaseReportRow> = BTreeMap::new();
        let mut received_count = 0;
        let mut draft_count = 0;
        let mut total_cost = Decimal::ZERO;
        let mut total_paid = Decimal::ZERO;
        for purchase in purchases {
            match purchase.status() {
                Some(stock_intake_purchase::PurchaseStatus::Received) => received_count += 1,
                _ => draft_count += 1,
            }
            total_cost += purchase.total_cost;
            total_paid += purchase.paid_amount;
            let row = by_status
                .entry(purchase.payment_status.clone())
                .or_insert_with(|| PurchaseReportRow {
                    payment_status: purchase.payment_status.clone(),
                    count: 0,
                    total_cost: Decimal::ZERO,
                    paid_amount: Decimal::ZERO,
                    unpaid_amount: Decimal::ZERO,
                });
            row.count += 1;
            row.total_cost += purchase.total_cost;
            row.paid_amount += purchase.paid_amount;
            row.unpaid_amount += purchase.unpaid_amount();
        }

        Ok(PurchaseReport {
            from: range.from,
            to: range.to,
            rows: by_status.into_values().collect(),
            received_count,
            draft_count,
            total_cost,
            total_paid,
            total_unpaid: total_cost - total_paid,
        })
    }

    /// Transfer and stock-request counts by approval status.
    #[instrument(skip(self))]
    pub async fn approval_report(&self, range: DateRange) -> Result<ApprovalReport, ServiceError> {
        let transfers = StockTransfers::find()
            .filter(stock_transfer::Column::CreatedAt.gte(range.from))
            .filter(stock_transfer::Column::CreatedAt.lte(range.to))
            .all(self.db.as_ref())
            .await?;
        let requests = StockRequests::find()
            .filter(stock_request::Column::CreatedAt.gte(range.from))
            .filter(stock_request::Column::CreatedAt.lte(range.to))
            .all(self.db.as_ref())
            .await?;

        let mut by_status: BTreeMap<String, ApprovalReportRow> = BTreeMap::new();
        for transfer in transfers {
            let row = by_status
                .entry(transfer.status.clone())
                .or_insert_with(|| ApprovalReportRow {
                    status: transfer.status.clone(),
                    transfer_count: 0,
                    request_count: 0,
                });
            row.transfer_count += 1;
        }
        for request in requests {
            let row = by_status
                .entry(request.status.clone())
                .or_insert_with(|| ApprovalReportRow {
                    status: request.status.clone(),
                    transfer_count: 0,
                    request_count: 0,
                });
            row.request_count += 1;
        }

        Ok(ApprovalReport {
            from: range.from,
            to: range.to,
            rows: by_status.into_values().collect(),
        })
    }

    /// Current stock valuation: quantity times running average per
    /// (location, variant), derived by folding the ledger.
    #[instrument(skip(self))]
    pub async fn valuation(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<ValuationReport, ServiceError> {
        let mut query = MovementRecords::find();
        if let Some(location_id) = location_id {
            query = query.filter(movement_record::Column::LocationId.eq(location_id));
        }
        let records = query
            .order_by_asc(movement_record::Column::Sequence)
            .all(self.db.as_ref())
            .await?;

        let mut balances: BTreeMap<(Uuid, Uuid), Balance> = BTreeMap::new();
        for record in records {
            let key = BalanceKey::new(record.location_id, record.variant_id);
            let entry = balances
                .entry((key.location_id, key.variant_id))
                .or_insert_with(Balance::empty);
            *entry = entry.apply(record.quantity, record.value, record.sequence);
        }

        let mut rows = Vec::new();
        let mut total_value = Decimal::ZERO;
        for ((location_id, variant_id), balance) in balances {
            if balance.total_quantity.is_zero() {
                continue;
            }
            let row_value = balance.total_quantity * balance.average_value;
            total_value += row_value;
            rows.push(ValuationRow {
                location_id,
                variant_id,
                total_quantity: balance.total_quantity,
                average_value: balance.average_value,
                total_value: row_value,
            });
        }

        Ok(ValuationReport { rows, total_value })
    }
}
