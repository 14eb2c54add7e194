//! `SeaORM` Entity for orders table (read-only here).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use chrono::Utc;
use mercato_core::analytics::OrderRecord;
use mercato_shared::types::{CustomerId, OrderId, ShopId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub shop_id: Uuid,
    pub customer_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for OrderRecord {
    fn from(model: Model) -> Self {
        Self {
            id: OrderId::from_uuid(model.id),
            shop_id: ShopId::from_uuid(model.shop_id),
            customer_id: CustomerId::from_uuid(model.customer_id),
            total: model.total,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
