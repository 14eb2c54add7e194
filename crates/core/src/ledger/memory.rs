//! In-memory money-flow store.
//!
//! Each shop ledger sits behind its own `RwLock`; appends hold the write
//! guard across the whole read-modify-write, reads share the read guard.
//! Used by tests and by the API test harness.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mercato_shared::types::ShopId;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::balance::{LedgerHead, LedgerSnapshot};
use super::entry::MoneyFlowEntry;
use super::error::LedgerError;
use super::service::{AppendInput, LedgerService};
use super::store::MoneyFlowStore;
use crate::aggregation::{Granularity, LedgerWindow, group_totals};

#[derive(Debug, Default)]
struct ShopLedger {
    entries: Vec<MoneyFlowEntry>,
    head: LedgerHead,
}

impl ShopLedger {
    /// Index range of entries in `[start, end)`; entries are kept sorted.
    fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[MoneyFlowEntry] {
        let from = self.entries.partition_point(|e| e.created_at < start);
        let to = self.entries.partition_point(|e| e.created_at < end);
        &self.entries[from..to.max(from)]
    }

    /// Balance after the latest entry at or before `at`.
    fn balance_at(&self, at: DateTime<Utc>) -> Decimal {
        let upto = self.entries.partition_point(|e| e.created_at <= at);
        upto.checked_sub(1).map_or(Decimal::ZERO, |i| self.entries[i].balance_after)
    }
}

/// Money-flow store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryMoneyFlowStore {
    ledgers: DashMap<ShopId, Arc<RwLock<ShopLedger>>>,
    last_id: AtomicI64,
}

impl InMemoryMoneyFlowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self, shop_id: ShopId) -> Option<Arc<RwLock<ShopLedger>>> {
        self.ledgers.get(&shop_id).map(|ledger| Arc::clone(&ledger))
    }

    fn ledger_or_create(&self, shop_id: ShopId) -> Arc<RwLock<ShopLedger>> {
        Arc::clone(&self.ledgers.entry(shop_id).or_default())
    }
}

#[async_trait]
impl MoneyFlowStore for InMemoryMoneyFlowStore {
    async fn append(
        &self,
        shop_id: ShopId,
        input: AppendInput,
    ) -> Result<MoneyFlowEntry, LedgerError> {
        let ledger = self.ledger_or_create(shop_id);
        let mut guard = ledger.write().await;

        let pending = LedgerService::prepare_append(&guard.head, input, Utc::now())?;
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = pending.into_entry(id, shop_id);

        guard.head = guard.head.advance(&entry);
        guard.entries.push(entry.clone());
        Ok(entry)
    }

    async fn head(&self, shop_id: ShopId) -> Result<LedgerHead, LedgerError> {
        match self.ledger(shop_id) {
            Some(ledger) => Ok(ledger.read().await.head.clone()),
            None => Ok(LedgerHead::empty()),
        }
    }

    async fn balance_at(&self, shop_id: ShopId, at: DateTime<Utc>) -> Result<Decimal, LedgerError> {
        match self.ledger(shop_id) {
            Some(ledger) => Ok(ledger.read().await.balance_at(at)),
            None => Ok(Decimal::ZERO),
        }
    }

    async fn entries_between(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MoneyFlowEntry>, LedgerError> {
        match self.ledger(shop_id) {
            Some(ledger) => Ok(ledger.read().await.range(start, end).to_vec()),
            None => Ok(Vec::new()),
        }
    }

    async fn snapshot(&self, shop_id: ShopId) -> Result<LedgerSnapshot, LedgerError> {
        let Some(ledger) = self.ledger(shop_id) else {
            return Ok(LedgerSnapshot::default());
        };
        let guard = ledger.read().await;
        Ok(LedgerSnapshot {
            head: guard.head.clone(),
            entries: guard.entries.clone(),
        })
    }

    async fn entry(&self, shop_id: ShopId, id: i64) -> Result<Option<MoneyFlowEntry>, LedgerError> {
        let Some(ledger) = self.ledger(shop_id) else {
            return Ok(None);
        };
        let guard = ledger.read().await;
        Ok(guard.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn window(
        &self,
        shop_id: ShopId,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        with_entries: bool,
    ) -> Result<LedgerWindow, LedgerError> {
        let Some(ledger) = self.ledger(shop_id) else {
            return Ok(LedgerWindow::default());
        };
        let guard = ledger.read().await;
        let range = guard.range(start, end);
        Ok(LedgerWindow {
            totals: group_totals(granularity, range)?,
            entries: with_entries.then(|| range.to_vec()),
            opening_balance: guard.balance_at(start),
            closing_balance: guard.balance_at(end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::balance::verify_chain;
    use crate::ledger::entry::FlowDirection;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_empty_scope_reads_as_zero() {
        let store = InMemoryMoneyFlowStore::new();
        let shop_id = ShopId::new();
        assert_eq!(store.head(shop_id).await.unwrap(), LedgerHead::empty());
        assert_eq!(store.balance_at(shop_id, t0()).await.unwrap(), Decimal::ZERO);
        assert_eq!(store.snapshot(shop_id).await.unwrap(), LedgerSnapshot::default());
        assert!(store.entry(shop_id, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_scenario_and_balance_at() {
        let store = InMemoryMoneyFlowStore::new();
        let shop_id = ShopId::new();

        let first = store
            .append(
                shop_id,
                AppendInput::new(FlowDirection::In, dec!(100), "sale").recorded_at(t0()),
            )
            .await
            .unwrap();
        assert_eq!(first.balance_after, dec!(100));

        let second = store
            .append(
                shop_id,
                AppendInput::new(FlowDirection::Out, dec!(30), "refund")
                    .recorded_at(t0() + Duration::minutes(1)),
            )
            .await
            .unwrap();
        assert_eq!(second.balance_after, dec!(70));

        let third = store
            .append(
                shop_id,
                AppendInput::new(FlowDirection::In, dec!(20), "sale")
                    .recorded_at(t0() + Duration::minutes(2)),
            )
            .await
            .unwrap();
        assert_eq!(third.balance_after, dec!(90));

        let just_after_second = second.created_at + Duration::seconds(1);
        assert_eq!(
            store.balance_at(shop_id, just_after_second).await.unwrap(),
            dec!(70)
        );
        assert_eq!(
            store.balance_at(shop_id, t0() - Duration::seconds(1)).await.unwrap(),
            Decimal::ZERO
        );
        assert_eq!(store.head(shop_id).await.unwrap().balance, dec!(90));
    }

    #[tokio::test]
    async fn test_entries_between_is_half_open() {
        let store = InMemoryMoneyFlowStore::new();
        let shop_id = ShopId::new();
        for minute in 0..4 {
            store
                .append(
                    shop_id,
                    AppendInput::new(FlowDirection::In, dec!(1), "tick")
                        .recorded_at(t0() + Duration::minutes(minute)),
                )
                .await
                .unwrap();
        }

        let entries = store
            .entries_between(shop_id, t0() + Duration::minutes(1), t0() + Duration::minutes(3))
            .await
            .unwrap();
        let minutes: Vec<_> = entries
            .iter()
            .map(|e| (e.created_at - t0()).num_minutes())
            .collect();
        assert_eq!(minutes, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let store = InMemoryMoneyFlowStore::new();
        let shop_a = ShopId::new();
        let shop_b = ShopId::new();

        let entry = store
            .append(shop_a, AppendInput::new(FlowDirection::In, dec!(10), "a"))
            .await
            .unwrap();
        store
            .append(shop_b, AppendInput::new(FlowDirection::Out, dec!(4), "b"))
            .await
            .unwrap();

        assert_eq!(store.head(shop_a).await.unwrap().balance, dec!(10));
        assert_eq!(store.head(shop_b).await.unwrap().balance, dec!(-4));
        assert!(store.entry(shop_b, entry.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_keep_chain_consistent() {
        let store = Arc::new(InMemoryMoneyFlowStore::new());
        let shop_id = ShopId::new();

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let direction = if i % 3 == 0 {
                        FlowDirection::Out
                    } else {
                        FlowDirection::In
                    };
                    store
                        .append(shop_id, AppendInput::new(direction, dec!(10), format!("flow {i}")))
                        .await
                })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        let snapshot = store.snapshot(shop_id).await.unwrap();
        let report = verify_chain(&snapshot.entries, &snapshot.head).unwrap();
        assert_eq!(report.entries_checked, 50);
        // 17 outflows (i % 3 == 0) and 33 inflows of 10 each.
        assert_eq!(snapshot.head.balance, dec!(160));
    }

    #[tokio::test]
    async fn test_overflowing_append_is_rejected_and_leaves_ledger_intact() {
        let store = InMemoryMoneyFlowStore::new();
        let shop_id = ShopId::new();
        let huge = (Decimal::MAX / dec!(2) + Decimal::ONE).trunc();

        store
            .append(shop_id, AppendInput::new(FlowDirection::In, huge, "first"))
            .await
            .unwrap();
        let result = store
            .append(shop_id, AppendInput::new(FlowDirection::In, huge, "second"))
            .await;

        assert!(matches!(result, Err(LedgerError::AmountOverflow)));
        let snapshot = store.snapshot(shop_id).await.unwrap();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.head.balance, huge);
    }

    #[tokio::test]
    async fn test_future_import_cannot_drag_the_ledger_clock() {
        let store = InMemoryMoneyFlowStore::new();
        let shop_id = ShopId::new();
        let far_future = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();

        let result = store
            .append(
                shop_id,
                AppendInput::new(FlowDirection::In, dec!(1), "import").recorded_at(far_future),
            )
            .await;
        assert!(matches!(result, Err(LedgerError::FutureEntry { .. })));

        let entry = store
            .append(shop_id, AppendInput::new(FlowDirection::In, dec!(1), "sale"))
            .await
            .unwrap();
        assert!(entry.created_at < far_future);
        assert_eq!(
            store
                .balance_at(shop_id, Utc::now() + Duration::days(1))
                .await
                .unwrap(),
            dec!(1)
        );
    }

    #[tokio::test]
    async fn test_window_reads_totals_entries_and_balances_together() {
        let store = InMemoryMoneyFlowStore::new();
        let shop_id = ShopId::new();
        for (minute, direction, amount) in [
            (0, FlowDirection::In, dec!(40)),
            (5, FlowDirection::Out, dec!(15)),
            (70, FlowDirection::In, dec!(10)),
        ] {
            store
                .append(
                    shop_id,
                    AppendInput::new(direction, amount, "flow")
                        .recorded_at(t0() + Duration::minutes(minute)),
                )
                .await
                .unwrap();
        }

        let window = store
            .window(
                shop_id,
                Granularity::Hour,
                t0() + Duration::minutes(1),
                t0() + Duration::hours(3),
                true,
            )
            .await
            .unwrap();
        assert_eq!(window.opening_balance, dec!(40));
        assert_eq!(window.closing_balance, dec!(35));
        assert_eq!(window.totals.len(), 2);
        assert_eq!(window.totals[0].total_outflow, dec!(15));
        assert_eq!(window.entries.as_ref().map(Vec::len), Some(2));

        let coarse = store
            .window(shop_id, Granularity::Day, t0(), t0() + Duration::days(1), false)
            .await
            .unwrap();
        assert!(coarse.entries.is_none());
        assert_eq!(coarse.totals[0].total_inflow, dec!(50));
    }
}
