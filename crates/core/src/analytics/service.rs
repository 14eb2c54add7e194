//! Analytics service: period-over-period comparisons per metric.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mercato_shared::types::ShopId;
use rust_decimal::Decimal;
use tracing::debug;

use super::comparison::compare_range;
use super::source::OrderMetrics;
use super::types::{AnalyticsOverview, ComparisonResult, Metric};
use crate::ledger::{LedgerError, MoneyFlowStore};

/// Compares shop metrics against the preceding period.
#[derive(Clone)]
pub struct AnalyticsService {
    ledger: Arc<dyn MoneyFlowStore>,
    orders: Arc<dyn OrderMetrics>,
}

impl AnalyticsService {
    /// Creates a service reading revenue from `ledger` and counts from `orders`.
    #[must_use]
    pub fn new(ledger: Arc<dyn MoneyFlowStore>, orders: Arc<dyn OrderMetrics>) -> Self {
        Self { ledger, orders }
    }

    /// Revenue over a window: `BalanceAtTime(end) - BalanceAtTime(start)`.
    async fn revenue(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        let closing = self.ledger.balance_at(shop_id, end).await?;
        let opening = self.ledger.balance_at(shop_id, start).await?;
        closing
            .checked_sub(opening)
            .ok_or(LedgerError::AmountOverflow)
    }

    /// Compares `metric` over `[start, end)` with the preceding period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` when `start > end`, or a storage error.
    pub async fn compare(
        &self,
        shop_id: ShopId,
        metric: Metric,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ComparisonResult, LedgerError> {
        let result = match metric {
            Metric::Orders => {
                compare_range(metric, start, end, |s, e| async move {
                    Ok(Decimal::from(self.orders.count_orders(shop_id, s, e).await?))
                })
                .await?
            }
            Metric::Revenue => {
                compare_range(metric, start, end, |s, e| self.revenue(shop_id, s, e)).await?
            }
            Metric::NewCustomers => {
                compare_range(metric, start, end, |s, e| async move {
                    Ok(Decimal::from(
                        self.orders.count_new_customers(shop_id, s, e).await?,
                    ))
                })
                .await?
            }
        };

        debug!(
            %shop_id,
            %metric,
            current = %result.current,
            previous = %result.previous,
            percent_delta = %result.percent_delta,
            "compared metric"
        );
        Ok(result)
    }

    /// Compares every metric over `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns the first error any comparison hits.
    pub async fn overview(
        &self,
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AnalyticsOverview, LedgerError> {
        let (orders, revenue, new_customers) = tokio::try_join!(
            self.compare(shop_id, Metric::Orders, start, end),
            self.compare(shop_id, Metric::Revenue, start, end),
            self.compare(shop_id, Metric::NewCustomers, start, end),
        )?;

        Ok(AnalyticsOverview {
            orders,
            revenue,
            new_customers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::source::MockOrderMetrics;
    use crate::ledger::{AppendInput, FlowDirection, InMemoryMoneyFlowStore};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, d, 0, 0, 0).unwrap()
    }

    fn quiet_orders() -> MockOrderMetrics {
        let mut orders = MockOrderMetrics::new();
        orders.expect_count_orders().returning(|_, _, _| Ok(0));
        orders.expect_count_new_customers().returning(|_, _, _| Ok(0));
        orders
    }

    #[tokio::test]
    async fn test_order_count_comparison() {
        let mut orders = MockOrderMetrics::new();
        orders
            .expect_count_orders()
            .times(2)
            .returning(|_, start, _| Ok(if start == day(10) { 150 } else { 100 }));

        let service = AnalyticsService::new(
            Arc::new(InMemoryMoneyFlowStore::new()),
            Arc::new(orders),
        );
        let result = service
            .compare(ShopId::new(), Metric::Orders, day(10), day(17))
            .await
            .unwrap();

        assert_eq!(result.current, dec!(150));
        assert_eq!(result.previous, dec!(100));
        assert_eq!(result.percent_delta, dec!(50));
        assert_eq!(result.previous_period.start, day(3));
    }

    #[tokio::test]
    async fn test_new_customers_from_zero_is_plus_hundred() {
        let mut orders = MockOrderMetrics::new();
        orders
            .expect_count_new_customers()
            .returning(|_, start, _| Ok(if start == day(10) { 4 } else { 0 }));

        let service = AnalyticsService::new(
            Arc::new(InMemoryMoneyFlowStore::new()),
            Arc::new(orders),
        );
        let result = service
            .compare(ShopId::new(), Metric::NewCustomers, day(10), day(11))
            .await
            .unwrap();

        assert_eq!(result.current, dec!(4));
        assert_eq!(result.percent_delta, dec!(100));
    }

    #[tokio::test]
    async fn test_revenue_is_balance_difference() {
        let ledger = Arc::new(InMemoryMoneyFlowStore::new());
        let shop_id = ShopId::new();
        let flows = [
            (day(1) + Duration::hours(10), FlowDirection::In, dec!(100)),
            (day(2) + Duration::hours(9), FlowDirection::Out, dec!(30)),
            (day(2) + Duration::hours(15), FlowDirection::In, dec!(20)),
        ];
        for (at, direction, amount) in flows {
            ledger
                .append(shop_id, AppendInput::new(direction, amount, "flow").recorded_at(at))
                .await
                .unwrap();
        }

        let service = AnalyticsService::new(ledger, Arc::new(quiet_orders()));
        let result = service
            .compare(shop_id, Metric::Revenue, day(2), day(3))
            .await
            .unwrap();

        assert_eq!(result.current, dec!(-10));
        assert_eq!(result.previous, dec!(100));
        assert_eq!(result.percent_delta, dec!(-110));
    }

    #[tokio::test]
    async fn test_overview_covers_every_metric() {
        let service = AnalyticsService::new(
            Arc::new(InMemoryMoneyFlowStore::new()),
            Arc::new(quiet_orders()),
        );
        let overview = service
            .overview(ShopId::new(), day(1), day(8))
            .await
            .unwrap();

        assert_eq!(overview.orders.metric, Metric::Orders);
        assert_eq!(overview.revenue.metric, Metric::Revenue);
        assert_eq!(overview.new_customers.metric, Metric::NewCustomers);
        assert_eq!(overview.revenue.percent_delta, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_metric_source_errors_propagate() {
        let mut orders = MockOrderMetrics::new();
        orders
            .expect_count_orders()
            .returning(|_, _, _| Err(LedgerError::Storage("connection reset".into())));

        let service = AnalyticsService::new(
            Arc::new(InMemoryMoneyFlowStore::new()),
            Arc::new(orders),
        );
        let result = service
            .compare(ShopId::new(), Metric::Orders, day(1), day(2))
            .await;
        assert!(matches!(result, Err(LedgerError::Storage(_))));
    }
}
