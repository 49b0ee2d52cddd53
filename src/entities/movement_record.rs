use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of a ledger movement. Positive-quantity kinds blend into the
/// weighted average; negative-quantity kinds leave it unchanged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Intake,
    Modification,
    OrderItemConsumption,
    TransferIn,
    TransferOut,
}

/// Workflow entity a movement record points back to. At most one per
/// record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    Purchase,
    Modification,
    OrderItem,
    Transfer,
    StockRequest,
}

/// One signed quantity/value delta against a (location, variant) balance.
/// Append-only; never mutated or deleted. The previous/new columns are
/// the weighted-average snapshot taken at append time, and `sequence` is
/// monotonically increasing per (location, variant).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "movement_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub stock_id: Uuid,
    pub variant_id: Uuid,
    pub location_id: Uuid,
    /// Stored as string; see [`MovementType`].
    pub movement_type: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub previous_total_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub previous_average_value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub new_total_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub new_average_value: Decimal,
    pub sequence: i64,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn movement_type(&self) -> Option<MovementType> {
        self.movement_type.parse().ok()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_type_round_trips_through_storage_form() {
        for kind in [
            MovementType::Intake,
            MovementType::Modification,
            MovementType::OrderItemConsumption,
            MovementType::TransferIn,
            MovementType::TransferOut,
        ] {
            let stored = kind.to_string();
            assert_eq!(stored.parse::<MovementType>().ok(), Some(kind));
        }
        assert_eq!(MovementType::TransferOut.to_string(), "TRANSFER_OUT");
        assert_eq!(
            MovementType::OrderItemConsumption.to_string(),
            "ORDER_ITEM_CONSUMPTION"
        );
    }
}
