//! Core business logic for Mercato money flows.
//!
//! This crate contains pure business logic with no web or database dependencies.
//! Storage is reached through traits; in-memory implementations live alongside.
//!
//! # Modules
//!
//! - `ledger` - Append-only money-flow ledger with running balances
//! - `aggregation` - Time-bucketed inflow/outflow totals
//! - `analytics` - Period-over-period metric comparison

pub mod aggregation;
pub mod analytics;
pub mod ledger;
