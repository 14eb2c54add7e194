//! `SeaORM` Entity for money_flows table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use chrono::Utc;
use mercato_core::ledger::MoneyFlowEntry;
use mercato_shared::types::ShopId;

use super::sea_orm_active_enums::FlowDirection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "money_flows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub shop_id: Uuid,
    pub description: String,
    pub direction: FlowDirection,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance_after: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MoneyFlowEntry {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            shop_id: ShopId::from_uuid(model.shop_id),
            description: model.description,
            direction: model.direction.into(),
            amount: model.amount,
            balance_after: model.balance_after,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
