//! `SeaORM` entity definitions.

pub mod ledger_heads;
pub mod money_flows;
pub mod orders;
pub mod sea_orm_active_enums;

pub mod prelude {
    //! Entity re-exports.
    pub use super::ledger_heads::Entity as LedgerHeads;
    pub use super::money_flows::Entity as MoneyFlows;
    pub use super::orders::Entity as Orders;
}
