//! Money-flow repository: PostgreSQL-backed ledger store.
//!
//! Appends run in one database transaction that locks the shop's
//! `ledger_heads` row (`SELECT ... FOR UPDATE`), so concurrent appends to the
//! same shop queue behind each other while other shops proceed. Multi-part
//! reads run in one read-only `REPEATABLE READ` transaction.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    AccessMode, ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait,
    DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, EntityTrait, FromQueryResult,
    IsolationLevel, QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use tracing::{debug, error};

use mercato_core::aggregation::{Granularity, LedgerWindow, PeriodTotals};
use mercato_core::ledger::{
    AppendInput, LedgerError, LedgerHead, LedgerService, LedgerSnapshot, MoneyFlowEntry,
    MoneyFlowStore,
};
use mercato_shared::types::ShopId;

use crate::entities::{ledger_heads, money_flows};

/// Converts a database error into a ledger storage error.
pub(crate) fn storage_error(err: DbErr) -> LedgerError {
    error!(error = %err, "money-flow storage failure");
    LedgerError::Storage(err.to_string())
}

/// Grouped sums for one truncated period.
#[derive(Debug, FromQueryResult)]
struct PeriodTotalsRow {
    period_start: NaiveDateTime,
    total_inflow: Decimal,
    total_outflow: Decimal,
}

impl From<PeriodTotalsRow> for PeriodTotals {
    fn from(row: PeriodTotalsRow) -> Self {
        Self {
            period_start: row.period_start.and_utc(),
            total_inflow: row.total_inflow,
            total_outflow: row.total_outflow,
        }
    }
}

/// Builds the grouped-sum query for `granularity`.
///
/// The truncation field is a fixed keyword from [`Granularity::as_str`],
/// never caller text. Parameters: `$1` shop, `$2` start, `$3` end.
fn period_totals_sql(granularity: Granularity) -> String {
    format!(
        "SELECT date_trunc('{field}', created_at AT TIME ZONE 'UTC') AS period_start,
                COALESCE(SUM(amount) FILTER (WHERE direction = 'in'), 0) AS total_inflow,
                COALESCE(SUM(amount) FILTER (WHERE direction = 'out'), 0) AS total_outflow
         FROM money_flows
         WHERE shop_id = $1 AND created_at >= $2 AND created_at < $3
         GROUP BY 1
         ORDER BY 1",
        field = granularity.as_str()
    )
}

fn scoped(shop_id: ShopId) -> sea_orm::Select<money_flows::Entity> {
    money_flows::Entity::find().filter(money_flows::Column::ShopId.eq(shop_id.into_inner()))
}

async fn load_head<C: ConnectionTrait>(conn: &C, shop_id: ShopId) -> Result<LedgerHead, DbErr> {
    let row = ledger_heads::Entity::find_by_id(shop_id.into_inner()).one(conn).await?;
    Ok(row.map_or_else(LedgerHead::empty, LedgerHead::from))
}

async fn load_balance_at<C: ConnectionTrait>(
    conn: &C,
    shop_id: ShopId,
    at: DateTime<Utc>,
) -> Result<Decimal, DbErr> {
    let latest = scoped(shop_id)
        .filter(money_flows::Column::CreatedAt.lte(at))
        .order_by_desc(money_flows::Column::CreatedAt)
        .order_by_desc(money_flows::Column::Id)
        .one(conn)
        .await?;
    Ok(latest.map_or(Decimal::ZERO, |row| row.balance_after))
}

/// Entries ordered by `(created_at, id)`, optionally limited to `[start, end)`.
async fn load_entries<C: ConnectionTrait>(
    conn: &C,
    shop_id: ShopId,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Result<Vec<MoneyFlowEntry>, DbErr> {
    let mut query = scoped(shop_id);
    if let Some((start, end)) = range {
        query = query
            .filter(money_flows::Column::CreatedAt.gte(start))
            .filter(money_flows::Column::CreatedAt.lt(end));
    }
    let rows = query
        .order_by_asc(money_flows::Column::CreatedAt)
        .order_by_asc(money_flows::Column::Id)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(MoneyFlowEntry::from).collect())
}

async fn load_period_totals<C: ConnectionTrait>(
    conn: &C,
    shop_id: ShopId,
    granularity: Granularity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<PeriodTotals>, DbErr> {
    let statement = Statement::from_sql_and_values(
        DbBackend::Postgres,
        period_totals_sql(granularity),
        [shop_id.into_inner().into(), start.into(), end.into()],
    );
    let rows = PeriodTotalsRow::find_by_statement(statement).all(conn).await?;
    Ok(rows.into_iter().map(PeriodTotals::from).collect())
}

/// Money-flow repository.
#[derive(Debug, Clone)]
pub struct MoneyFlowRepository {
    db: DatabaseConnection,
}

impl MoneyFlowRepository {
    /// Creates a new money-flow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends inside one transaction holding the shop's head row lock.
    async fn append_locked(
        &self,
        shop_id: ShopId,
        input: AppendInput,
    ) -> Result<Result<MoneyFlowEntry, LedgerError>, DbErr> {
        let shop_uuid = shop_id.into_inner();
        let now = Utc::now();
        let txn = self.db.begin().await?;

        // Make sure the head row exists so there is something to lock.
        ledger_heads::Entity::insert(ledger_heads::ActiveModel {
            shop_id: Set(shop_uuid),
            balance: Set(Decimal::ZERO),
            last_entry_id: Set(None),
            last_recorded_at: Set(None),
            version: Set(0),
            updated_at: Set(now.into()),
        })
        .on_conflict(
            OnConflict::column(ledger_heads::Column::ShopId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let head_row = ledger_heads::Entity::find_by_id(shop_uuid)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("ledger head for shop {shop_id}")))?;
        let head = LedgerHead::from(head_row.clone());

        let pending = match LedgerService::prepare_append(&head, input, now) {
            Ok(pending) => pending,
            Err(err) => {
                txn.rollback().await?;
                return Ok(Err(err));
            }
        };

        let inserted = money_flows::ActiveModel {
            id: NotSet,
            shop_id: Set(shop_uuid),
            description: Set(pending.description.clone()),
            direction: Set(pending.direction.into()),
            amount: Set(pending.amount),
            balance_after: Set(pending.balance_after),
            created_at: Set(pending.created_at.into()),
        }
        .insert(&txn)
        .await?;
        let entry = MoneyFlowEntry::from(inserted);

        let next = head.advance(&entry);
        let mut head_update: ledger_heads::ActiveModel = head_row.into();
        head_update.balance = Set(next.balance);
        head_update.last_entry_id = Set(next.last_entry_id);
        head_update.last_recorded_at = Set(next.last_recorded_at.map(Into::into));
        head_update.version = Set(next.version);
        head_update.updated_at = Set(now.into());
        head_update.update(&txn).await?;

        txn.commit().await?;
        Ok(Ok(entry))
    }

    /// Opens a read-only transaction that sees one snapshot throughout.
    async fn begin_snapshot(&self) -> Result<DatabaseTransaction, DbErr> {
        self.db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
            .await
    }

    async fn read_snapshot(&self, shop_id: ShopId) -> Result<LedgerSnapshot, DbErr> {
        let txn = self.begin_snapshot().await?;
        let head = load_head(&txn, shop_id).await?;
        let entries = load_entries(&txn, shop_id, None).await?;
        txn.commit().await?;
        Ok(LedgerSnapshot { head, entries })
    }

    async fn read_window(
        &self,
        shop_id: ShopId,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        with_entries: bool,
    ) -> Result<LedgerWindow, DbErr> {
        let txn = self.begin_snapshot().await?;
        let totals = load_period_totals(&txn, shop_id, granularity, start, end).await?;
        let entries = if with_entries {
            Some(load_entries(&txn, shop_id, Some((start, end))).await?)
        } else {
            None
        };
        let opening_balance = load_balance_at(&txn, shop_id, start).await?;
        let closing_balance = load_balance_at(&txn, shop_id, end).await?;
        txn.commit().await?;

        Ok(LedgerWindow {
            totals,
            entries,
            opening_balance,
            closing_balance,
        })
    }
}

#[async_trait::async_trait]
impl MoneyFlowStore for MoneyFlowRepository {
    async fn append(
        &self,
        shop_id: ShopId,
        input: AppendInput,
    ) -> Result<MoneyFlowEntry, LedgerError> {
        self.append_locked(shop_id, input)
            .await
            .map_err(storage_error)?
    }

    async fn head(&self, shop_id: ShopId) -> Result<LedgerHead, LedgerError> {
        load_head(&self.db, shop_id).await.map_err(storage_error)
    }

    async fn balance_at(&self, shop_id: ShopId, at: DateTime<Utc>) -> Result<Decimal, LedgerError> {
        load_balance_at(&self.db, shop_id, at).await.map_err(storage_error)
    }

    async fn entries_between(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MoneyFlowEntry>, LedgerError> {
        load_entries(&self.db, shop_id, Some((start, end))).await.map_err(storage_error)
    }

    async fn snapshot(&self, shop_id: ShopId) -> Result<LedgerSnapshot, LedgerError> {
        self.read_snapshot(shop_id).await.map_err(storage_error)
    }

    async fn entry(&self, shop_id: ShopId, id: i64) -> Result<Option<MoneyFlowEntry>, LedgerError> {
        let row = scoped(shop_id)
            .filter(money_flows::Column::Id.eq(id))
            .one(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(row.map(MoneyFlowEntry::from))
    }

    async fn window(
        &self,
        shop_id: ShopId,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        with_entries: bool,
    ) -> Result<LedgerWindow, LedgerError> {
        debug!(%shop_id, %granularity, %start, %end, "grouping money flows");
        self.read_window(shop_id, granularity, start, end, with_entries)
            .await
            .map_err(storage_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use mercato_core::ledger::FlowDirection;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::entities::sea_orm_active_enums;

    #[test]
    fn test_period_totals_sql_uses_granularity_keyword() {
        for granularity in Granularity::ALL {
            let sql = period_totals_sql(granularity);
            assert!(sql.contains(&format!("date_trunc('{}',", granularity.as_str())));
            assert!(sql.contains("GROUP BY 1"));
        }
    }

    #[test]
    fn test_period_row_is_read_as_utc() {
        let row = PeriodTotalsRow {
            period_start: NaiveDate::from_ymd_opt(2026, 5, 4)
                .unwrap()
                .and_hms_opt(13, 0, 0)
                .unwrap(),
            total_inflow: dec!(10),
            total_outflow: dec!(4),
        };
        let totals = PeriodTotals::from(row);
        assert_eq!(
            totals.period_start,
            Utc.with_ymd_and_hms(2026, 5, 4, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_money_flow_model_converts_to_entry() {
        let shop = Uuid::new_v4();
        let created_at = Utc.with_ymd_and_hms(2026, 5, 4, 13, 30, 0).unwrap();
        let model = money_flows::Model {
            id: 42,
            shop_id: shop,
            description: "payout".into(),
            direction: sea_orm_active_enums::FlowDirection::Out,
            amount: dec!(12.5000),
            balance_after: dec!(87.5000),
            created_at: created_at.into(),
        };

        let entry = MoneyFlowEntry::from(model);
        assert_eq!(entry.id, 42);
        assert_eq!(entry.shop_id.into_inner(), shop);
        assert_eq!(entry.direction, FlowDirection::Out);
        assert_eq!(entry.signed_amount(), dec!(-12.5));
        assert_eq!(entry.created_at, created_at);
    }

    #[test]
    fn test_head_model_converts_to_head() {
        let model = ledger_heads::Model {
            shop_id: Uuid::new_v4(),
            balance: dec!(70),
            last_entry_id: Some(2),
            last_recorded_at: Some(Utc.with_ymd_and_hms(2026, 5, 4, 0, 0, 0).unwrap().into()),
            version: 2,
            updated_at: Utc::now().into(),
        };
        let head = LedgerHead::from(model);
        assert_eq!(head.balance, dec!(70));
        assert_eq!(head.version, 2);
        assert_eq!(head.last_entry_id, Some(2));
    }
}
