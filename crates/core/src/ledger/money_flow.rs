//! Money-flow ledger operations over a pluggable store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mercato_shared::types::ShopId;
use rust_decimal::Decimal;
use tracing::{error, info};

use super::balance::{AuditReport, verify_chain};
use super::entry::MoneyFlowEntry;
use super::error::LedgerError;
use super::service::{AppendInput, LedgerService};
use super::store::MoneyFlowStore;
use crate::aggregation::{AggregationService, Granularity, LedgerView};

/// Read/write operations on shop money-flow ledgers.
#[derive(Clone)]
pub struct MoneyFlowService {
    store: Arc<dyn MoneyFlowStore>,
}

impl MoneyFlowService {
    /// Creates a service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn MoneyFlowStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MoneyFlowStore> {
        &self.store
    }

    /// Appends one entry; the only balance-mutating operation.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a negative amount or backdated
    /// timestamp, or a storage error.
    pub async fn append(
        &self,
        shop_id: ShopId,
        input: AppendInput,
    ) -> Result<MoneyFlowEntry, LedgerError> {
        LedgerService::validate_amount(input.amount)?;
        let entry = self.store.append(shop_id, input).await?;
        info!(
            %shop_id,
            entry_id = entry.id,
            direction = %entry.direction,
            amount = %entry.amount,
            balance_after = %entry.balance_after,
            "money flow recorded"
        );
        Ok(entry)
    }

    /// Balance after the latest entry, or zero.
    pub async fn current_balance(&self, shop_id: ShopId) -> Result<Decimal, LedgerError> {
        Ok(self.store.head(shop_id).await?.balance)
    }

    /// Balance after the latest entry at or before `at`, or zero.
    pub async fn balance_at(
        &self,
        shop_id: ShopId,
        at: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        self.store.balance_at(shop_id, at).await
    }

    /// Entries in `[start, end)`, ascending.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` when `start > end`.
    pub async fn transactions(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MoneyFlowEntry>, LedgerError> {
        LedgerService::validate_range(start, end)?;
        self.store.entries_between(shop_id, start, end).await
    }

    /// Looks up a single entry.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the id is not in this shop's ledger.
    pub async fn transaction(
        &self,
        shop_id: ShopId,
        id: i64,
    ) -> Result<MoneyFlowEntry, LedgerError> {
        self.store
            .entry(shop_id, id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))
    }

    /// Bucketed ledger for `[start, end)` with opening and closing balances.
    ///
    /// The granularity follows the range length unless one is requested.
    pub async fn ledger(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Option<Granularity>,
    ) -> Result<LedgerView, LedgerError> {
        AggregationService::ledger_view(self.store.as_ref(), shop_id, start, end, granularity)
            .await
    }

    /// Re-walks the whole chain and compares it with the stored head.
    ///
    /// Head and entries come from one snapshot, so concurrent appends are
    /// either fully visible or not at all.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentState` for the first mismatch. Nothing is repaired.
    pub async fn audit(&self, shop_id: ShopId) -> Result<AuditReport, LedgerError> {
        let snapshot = self.store.snapshot(shop_id).await?;

        match verify_chain(&snapshot.entries, &snapshot.head) {
            Ok(report) => {
                info!(%shop_id, entries = report.entries_checked, "ledger audit passed");
                Ok(report)
            }
            Err(err) => {
                error!(%shop_id, error = %err, "ledger audit failed; manual reconciliation required");
                Err(err)
            }
        }
    }
}
