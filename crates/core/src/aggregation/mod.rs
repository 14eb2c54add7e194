//! Time-bucketed aggregation of money flows.
//!
//! A query range picks its bucket width from its length, entries are grouped
//! into calendar-aligned buckets, and only periods with activity are returned.

pub mod bucket;
pub mod granularity;
pub mod service;

pub use bucket::{Bucket, LedgerView, LedgerWindow, PeriodTotals};
pub use granularity::Granularity;
pub use service::{AggregationService, build_buckets, group_totals};
