//! Repository abstractions for data access.
//!
//! Repositories implement the core storage traits, hiding the `SeaORM`
//! implementation details from the rest of the application.

pub mod money_flow;
pub mod order;

pub use money_flow::MoneyFlowRepository;
pub use order::OrderRepository;
