//! Money-flow entry domain types.

use chrono::{DateTime, Utc};
use mercato_shared::types::ShopId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Direction of a money movement relative to the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    /// Money entering the shop (sales, top-ups).
    In,
    /// Money leaving the shop (payouts, refunds, fees).
    Out,
}

impl FlowDirection {
    /// Applies `amount` in this direction, positive for inflows.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::In => amount,
            Self::Out => -amount,
        }
    }

    /// Returns the lowercase wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl std::fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlowDirection {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            _ => Err(LedgerError::InvalidDirection(s.to_string())),
        }
    }
}

/// A single money-flow entry in a shop ledger.
///
/// Entries are immutable once appended. `balance_after` is computed against
/// the ledger tail at append time and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyFlowEntry {
    /// Monotonically assigned identifier; breaks `created_at` ties.
    pub id: i64,
    /// Ledger scope.
    pub shop_id: ShopId,
    /// Free-text description.
    pub description: String,
    /// In or out.
    pub direction: FlowDirection,
    /// Non-negative amount.
    pub amount: Decimal,
    /// Running balance immediately after this entry.
    pub balance_after: Decimal,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

impl MoneyFlowEntry {
    /// Returns the signed amount (positive in, negative out).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.direction.signed(self.amount)
    }

    /// Returns the ledger ordering key.
    #[must_use]
    pub fn order_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }
}
