//! Aggregation result types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::granularity::Granularity;
use crate::ledger::MoneyFlowEntry;

/// Grouped inflow/outflow sums for one period, as returned by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodTotals {
    /// Truncated period start.
    pub period_start: DateTime<Utc>,
    /// Sum of inflow amounts in the period.
    pub total_inflow: Decimal,
    /// Sum of outflow amounts in the period.
    pub total_outflow: Decimal,
}

/// One consistent read of a range, as returned by a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerWindow {
    /// Sparse grouped totals, ascending.
    pub totals: Vec<PeriodTotals>,
    /// Entries in the range, when requested.
    pub entries: Option<Vec<MoneyFlowEntry>>,
    /// Balance at the range start.
    pub opening_balance: Decimal,
    /// Balance at the range end.
    pub closing_balance: Decimal,
}

/// A time-windowed aggregate of ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Label identifying the bucket start, formatted per granularity.
    pub period: String,
    /// Bucket start.
    pub period_start: DateTime<Utc>,
    /// Sum of inflows in `[period_start, next period)`.
    pub total_inflow: Decimal,
    /// Sum of outflows in `[period_start, next period)`.
    pub total_outflow: Decimal,
    /// `total_inflow - total_outflow`.
    pub net_balance: Decimal,
    /// Constituent entries; `Some` (possibly empty) only for minute/hour buckets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<MoneyFlowEntry>>,
}

impl Bucket {
    /// Builds a bucket from grouped totals, without entries.
    #[must_use]
    pub fn from_totals(granularity: Granularity, totals: &PeriodTotals) -> Self {
        Self {
            period: granularity.label(totals.period_start),
            period_start: totals.period_start,
            total_inflow: totals.total_inflow,
            total_outflow: totals.total_outflow,
            net_balance: totals.total_inflow - totals.total_outflow,
            entries: None,
        }
    }
}

/// Bucketed ledger for a range, with balances at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerView {
    /// Granularity chosen for the range.
    pub granularity: Granularity,
    /// Balance at the range start.
    pub opening_balance: Decimal,
    /// Balance at the range end.
    pub closing_balance: Decimal,
    /// Non-empty buckets in ascending order.
    pub buckets: Vec<Bucket>,
}
