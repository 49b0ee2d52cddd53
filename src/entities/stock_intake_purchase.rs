use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    Draft,
    Received,
}

/// Payment sub-state, derived from `paid_amount` against `total_cost`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    /// Derives the payment sub-state from the amounts. `paid_amount`
    /// never exceeds `total_cost`.
    pub fn derive(paid_amount: Decimal, total_cost: Decimal) -> Self {
        if paid_amount <= Decimal::ZERO {
            PaymentStatus::Unpaid
        } else if paid_amount < total_cost {
            PaymentStatus::PartiallyPaid
        } else {
            PaymentStatus::Paid
        }
    }
}

/// Supplier intake purchase: DRAFT until delivery is confirmed, at which
/// point one INTAKE movement per line item lands on the ledger. Payments
/// move the derived payment sub-state without touching the ledger.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "stock_intake_purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub supplier_id: Uuid,
    /// Destination location for the intake records.
    pub location_id: Uuid,
    pub status: String,
    pub payment_status: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub paid_amount: Decimal,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn status(&self) -> Option<PurchaseStatus> {
        self.status.parse().ok()
    }

    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.payment_status.parse().ok()
    }

    pub fn unpaid_amount(&self) -> Decimal {
        self.total_cost - self.paid_amount
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::purchase_line_item::Entity")]
    PurchaseLineItem,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::purchase_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseLineItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn payment_status_derivation() {
        assert_eq!(
            PaymentStatus::derive(dec!(0), dec!(100)),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            PaymentStatus::derive(dec!(40), dec!(100)),
            PaymentStatus::PartiallyPaid
        );
        assert_eq!(
            PaymentStatus::derive(dec!(100), dec!(100)),
            PaymentStatus::Paid
        );
    }
}
