//! Order repository: order counts and first-order customer counts.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, Set, Statement,
};

use mercato_core::analytics::{OrderMetrics, OrderRecord};
use mercato_core::ledger::LedgerError;
use mercato_shared::types::ShopId;

use super::money_flow::storage_error;
use crate::entities::orders;

/// Customers whose earliest order in the shop falls in `[$2, $3)`.
const NEW_CUSTOMERS_SQL: &str = r"
SELECT COUNT(*) AS count
FROM (
    SELECT customer_id, MIN(created_at) AS first_order_at
    FROM orders
    WHERE shop_id = $1
    GROUP BY customer_id
) firsts
WHERE first_order_at >= $2 AND first_order_at < $3
";

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

/// Order repository.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: DatabaseConnection,
}

impl OrderRepository {
    /// Creates a new order repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an order (used by the seeder and tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record(&self, order: &OrderRecord) -> Result<(), DbErr> {
        orders::ActiveModel {
            id: Set(order.id.into_inner()),
            shop_id: Set(order.shop_id.into_inner()),
            customer_id: Set(order.customer_id.into_inner()),
            total: Set(order.total),
            created_at: Set(order.created_at.into()),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl OrderMetrics for OrderRepository {
    async fn count_orders(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, LedgerError> {
        orders::Entity::find()
            .filter(orders::Column::ShopId.eq(shop_id.into_inner()))
            .filter(orders::Column::CreatedAt.gte(start))
            .filter(orders::Column::CreatedAt.lt(end))
            .count(&self.db)
            .await
            .map_err(storage_error)
    }

    async fn count_new_customers(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, LedgerError> {
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            NEW_CUSTOMERS_SQL,
            [shop_id.into_inner().into(), start.into(), end.into()],
        );
        let row = CountRow::find_by_statement(statement)
            .one(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(row.map_or(0, |row| u64::try_from(row.count).unwrap_or(0)))
    }
}
