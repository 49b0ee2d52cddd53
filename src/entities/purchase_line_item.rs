use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One ordered line of a stock intake purchase.
/// `line_cost = quantity * unit_cost` is fixed at creation and becomes
/// the value of the INTAKE movement on delivery.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "purchase_line_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub stock_id: Uuid,
    pub variant_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub line_cost: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_intake_purchase::Entity",
        from = "Column::PurchaseId",
        to = "super::stock_intake_purchase::Column::Id"
    )]
    StockIntakePurchase,
}

impl Related<super::stock_intake_purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockIntakePurchase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
