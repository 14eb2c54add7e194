//! `SeaORM` active enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use mercato_core::ledger::FlowDirection as DomainFlowDirection;

/// Stored direction of a money flow (`CHECK (direction IN ('in', 'out'))`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(3))")]
pub enum FlowDirection {
    /// Money entering the shop.
    #[sea_orm(string_value = "in")]
    In,
    /// Money leaving the shop.
    #[sea_orm(string_value = "out")]
    Out,
}

impl From<FlowDirection> for DomainFlowDirection {
    fn from(direction: FlowDirection) -> Self {
        match direction {
            FlowDirection::In => Self::In,
            FlowDirection::Out => Self::Out,
        }
    }
}

impl From<DomainFlowDirection> for FlowDirection {
    fn from(direction: DomainFlowDirection) -> Self {
        match direction {
            DomainFlowDirection::In => Self::In,
            DomainFlowDirection::Out => Self::Out,
        }
    }
}
