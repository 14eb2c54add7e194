//! Order-side metric sources.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mercato_shared::types::{CustomerId, OrderId, ShopId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// A placed order as seen by analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Order identifier.
    pub id: OrderId,
    /// Shop the order was placed in.
    pub shop_id: ShopId,
    /// Ordering customer.
    pub customer_id: CustomerId,
    /// Order total.
    pub total: Decimal,
    /// Placement time.
    pub created_at: DateTime<Utc>,
}

/// Counts derived from a shop's orders over half-open periods `[start, end)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderMetrics: Send + Sync {
    /// Number of orders placed in the period.
    async fn count_orders(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, LedgerError>;

    /// Number of customers whose first order in the shop falls in the period.
    async fn count_new_customers(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, LedgerError>;
}
