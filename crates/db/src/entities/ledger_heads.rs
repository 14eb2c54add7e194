//! `SeaORM` Entity for ledger_heads table.
//!
//! One row per shop; the row lock serializes appends to that shop's ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use chrono::Utc;
use mercato_core::ledger::LedgerHead;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_heads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub shop_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance: Decimal,
    pub last_entry_id: Option<i64>,
    pub last_recorded_at: Option<DateTimeWithTimeZone>,
    pub version: i64,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LedgerHead {
    fn from(model: Model) -> Self {
        Self {
            balance: model.balance,
            last_entry_id: model.last_entry_id,
            last_recorded_at: model.last_recorded_at.map(|at| at.with_timezone(&Utc)),
            version: model.version,
        }
    }
}
