//! Time-bucket aggregation over a money-flow store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mercato_shared::types::ShopId;
use rust_decimal::Decimal;
use tracing::debug;

use super::bucket::{Bucket, LedgerView, PeriodTotals};
use super::granularity::Granularity;
use crate::ledger::{FlowDirection, LedgerError, LedgerService, MoneyFlowEntry, MoneyFlowStore};

/// Groups entries into per-period inflow/outflow sums.
///
/// Stores without a native GROUP BY use this; the result is sparse and
/// ascending, like the SQL query it stands in for.
///
/// # Errors
///
/// Returns `AmountOverflow` if a period sum leaves the decimal range.
pub fn group_totals(
    granularity: Granularity,
    entries: &[MoneyFlowEntry],
) -> Result<Vec<PeriodTotals>, LedgerError> {
    let mut grouped: BTreeMap<DateTime<Utc>, PeriodTotals> = BTreeMap::new();
    for entry in entries {
        let period_start = granularity.truncate(entry.created_at);
        let totals = grouped.entry(period_start).or_insert_with(|| PeriodTotals {
            period_start,
            total_inflow: Decimal::ZERO,
            total_outflow: Decimal::ZERO,
        });
        let sum = match entry.direction {
            FlowDirection::In => &mut totals.total_inflow,
            FlowDirection::Out => &mut totals.total_outflow,
        };
        *sum = sum
            .checked_add(entry.amount)
            .ok_or(LedgerError::AmountOverflow)?;
    }
    Ok(grouped.into_values().collect())
}

/// Turns grouped totals into labelled buckets, attaching `entries` by period.
///
/// With `entries` present every bucket gets a list, empty if nothing matched.
#[must_use]
pub fn build_buckets(
    granularity: Granularity,
    mut totals: Vec<PeriodTotals>,
    entries: Option<Vec<MoneyFlowEntry>>,
) -> Vec<Bucket> {
    totals.sort_by_key(|t| t.period_start);

    let mut by_period = entries.map(|entries| {
        let mut map: BTreeMap<DateTime<Utc>, Vec<MoneyFlowEntry>> = BTreeMap::new();
        for entry in entries {
            map.entry(granularity.truncate(entry.created_at))
                .or_default()
                .push(entry);
        }
        map
    });

    totals
        .iter()
        .map(|t| {
            let mut bucket = Bucket::from_totals(granularity, t);
            if let Some(map) = by_period.as_mut() {
                bucket.entries = Some(map.remove(&t.period_start).unwrap_or_default());
            }
            bucket
        })
        .collect()
}

/// Aggregation service.
pub struct AggregationService;

impl AggregationService {
    /// Buckets the scope's entries in `[start, end)` at the granularity picked
    /// from the range length.
    ///
    /// Returns the chosen granularity with the sparse bucket list. An empty
    /// range yields no buckets.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` when `start > end`, or a storage error.
    pub async fn aggregate(
        store: &dyn MoneyFlowStore,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(Granularity, Vec<Bucket>), LedgerError> {
        let view = Self::ledger_view(store, shop_id, start, end, None).await?;
        Ok((view.granularity, view.buckets))
    }

    /// Buckets `[start, end)` at an explicitly requested granularity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` when `start > end`, or a storage error.
    pub async fn aggregate_with(
        store: &dyn MoneyFlowStore,
        shop_id: ShopId,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bucket>, LedgerError> {
        let view = Self::ledger_view(store, shop_id, start, end, Some(granularity)).await?;
        Ok(view.buckets)
    }

    /// Buckets `[start, end)` and adds the balances at both ends.
    ///
    /// `granularity` overrides the range-based choice when given. Totals,
    /// entries and balances come from a single store read.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` when `start > end`, or a storage error.
    pub async fn ledger_view(
        store: &dyn MoneyFlowStore,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Option<Granularity>,
    ) -> Result<LedgerView, LedgerError> {
        LedgerService::validate_range(start, end)?;
        let granularity = granularity.unwrap_or_else(|| Granularity::for_duration(end - start));

        let window = store
            .window(shop_id, granularity, start, end, granularity.includes_entries())
            .await?;

        debug!(
            %shop_id,
            %granularity,
            periods = window.totals.len(),
            "aggregated money flows"
        );

        Ok(LedgerView {
            granularity,
            opening_balance: window.opening_balance,
            closing_balance: window.closing_balance,
            buckets: build_buckets(granularity, window.totals, window.entries),
        })
    }
}
