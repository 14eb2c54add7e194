//! Analytics domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// A metric that can be compared period over period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Number of orders placed in the period.
    Orders,
    /// Net money flow over the period.
    Revenue,
    /// Customers whose first order in the shop falls in the period.
    NewCustomers,
}

impl Metric {
    /// All supported metrics.
    pub const ALL: [Self; 3] = [Self::Orders, Self::Revenue, Self::NewCustomers];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Revenue => "revenue",
            Self::NewCustomers => "new_customers",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| LedgerError::UnknownMetric(s.to_string()))
    }
}

/// A half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

/// A metric for a period and its immediately preceding period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Compared metric.
    pub metric: Metric,
    /// Value in the requested period.
    pub current: Decimal,
    /// Value in the preceding period.
    pub previous: Decimal,
    /// Relative change in percent, rounded half-up to 2 places.
    #[serde(with = "rust_decimal::serde::float")]
    pub percent_delta: Decimal,
    /// Requested period.
    pub current_period: Period,
    /// Preceding period of equal length (at least one day).
    pub previous_period: Period,
}

/// All metric comparisons for one range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsOverview {
    /// Order count comparison.
    pub orders: ComparisonResult,
    /// Revenue comparison.
    pub revenue: ComparisonResult,
    /// New-customer comparison.
    pub new_customers: ComparisonResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parse() {
        assert_eq!("orders".parse::<Metric>().unwrap(), Metric::Orders);
        assert_eq!("Revenue".parse::<Metric>().unwrap(), Metric::Revenue);
        assert_eq!(
            "new-customers".parse::<Metric>().unwrap(),
            Metric::NewCustomers
        );
        assert!(matches!(
            "returns".parse::<Metric>(),
            Err(LedgerError::UnknownMetric(m)) if m == "returns"
        ));
    }

    #[test]
    fn test_metric_serde_matches_as_str() {
        for metric in Metric::ALL {
            let json = serde_json::to_string(&metric).unwrap();
            assert_eq!(json, format!("\"{}\"", metric.as_str()));
        }
    }
}
