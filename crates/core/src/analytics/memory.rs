//! In-memory order book.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mercato_shared::types::{CustomerId, ShopId};

use super::source::{OrderMetrics, OrderRecord};
use crate::ledger::LedgerError;

/// Order metrics over orders kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryOrderBook {
    orders: DashMap<ShopId, Vec<OrderRecord>>,
}

impl InMemoryOrderBook {
    /// Creates an empty order book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a placed order.
    pub fn record(&self, order: OrderRecord) {
        self.orders.entry(order.shop_id).or_default().push(order);
    }
}

fn within(at: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start <= at && at < end
}

#[async_trait]
impl OrderMetrics for InMemoryOrderBook {
    async fn count_orders(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, LedgerError> {
        let count = self.orders.get(&shop_id).map_or(0, |orders| {
            orders
                .iter()
                .filter(|o| within(o.created_at, start, end))
                .count()
        });
        Ok(count as u64)
    }

    async fn count_new_customers(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, LedgerError> {
        let Some(orders) = self.orders.get(&shop_id) else {
            return Ok(0);
        };

        let mut first_order: HashMap<CustomerId, DateTime<Utc>> = HashMap::new();
        for order in orders.iter() {
            first_order
                .entry(order.customer_id)
                .and_modify(|first| *first = (*first).min(order.created_at))
                .or_insert(order.created_at);
        }

        let count = first_order
            .values()
            .filter(|first| within(**first, start, end))
            .count();
        Ok(count as u64)
    }
}
