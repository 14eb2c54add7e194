//! Storage seam for money-flow ledgers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mercato_shared::types::ShopId;
use rust_decimal::Decimal;

use super::balance::{LedgerHead, LedgerSnapshot};
use super::entry::MoneyFlowEntry;
use super::error::LedgerError;
use super::service::AppendInput;
use crate::aggregation::{Granularity, LedgerWindow};

/// Persistence operations a money-flow ledger needs.
///
/// Implementations must serialize `append` per shop scope: the head read,
/// the entry insert, and the head update happen as one atomic unit.
/// Multi-part reads (`snapshot`, `window`) see one consistent state.
/// All ranges are half-open `[start, end)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MoneyFlowStore: Send + Sync {
    /// Appends an entry computed against the current head and advances the head.
    async fn append(
        &self,
        shop_id: ShopId,
        input: AppendInput,
    ) -> Result<MoneyFlowEntry, LedgerError>;

    /// Returns the ledger head (empty head for an unknown scope).
    async fn head(&self, shop_id: ShopId) -> Result<LedgerHead, LedgerError>;

    /// `balance_after` of the latest entry with `created_at <= at`, or zero.
    async fn balance_at(&self, shop_id: ShopId, at: DateTime<Utc>) -> Result<Decimal, LedgerError>;

    /// Entries in `[start, end)` ordered by `(created_at, id)`.
    async fn entries_between(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MoneyFlowEntry>, LedgerError>;

    /// The head together with every entry it covers, read at one instant.
    async fn snapshot(&self, shop_id: ShopId) -> Result<LedgerSnapshot, LedgerError>;

    /// Looks up one entry within the scope.
    async fn entry(&self, shop_id: ShopId, id: i64) -> Result<Option<MoneyFlowEntry>, LedgerError>;

    /// Grouped totals for `[start, end)` with the balances at both ends, read
    /// at one instant.
    ///
    /// Totals are sparse and ascending. Entries are included only when
    /// `with_entries` is set.
    async fn window(
        &self,
        shop_id: ShopId,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        with_entries: bool,
    ) -> Result<LedgerWindow, LedgerError>;
}
