//! Append-only money-flow ledger.
//!
//! This module implements the core ledger functionality:
//! - Money-flow entries with running balances
//! - The explicit ledger head and balance-chain audit
//! - Append validation (amounts, timestamps, ranges)
//! - The storage trait and an in-memory implementation
//! - The service used by the HTTP layer

pub mod balance;
pub mod entry;
pub mod error;
pub mod memory;
pub mod money_flow;
pub mod service;
pub mod store;

pub use balance::{AuditReport, LedgerHead, LedgerSnapshot, running_sum, verify_chain};
pub use entry::{FlowDirection, MoneyFlowEntry};
pub use error::LedgerError;
pub use memory::InMemoryMoneyFlowStore;
pub use money_flow::MoneyFlowService;
pub use service::{
    AppendInput, LedgerService, MAX_AMOUNT_SCALE, MAX_CLOCK_SKEW_SECS, PendingEntry,
};
pub use store::MoneyFlowStore;
