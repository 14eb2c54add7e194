//! Ledger service: append validation and balance computation.
//!
//! Pure business logic with no storage dependencies. Stores call
//! [`LedgerService::prepare_append`] while holding the ledger scope's writer
//! lock, so the head they pass in is the true tail.

use chrono::{DateTime, Duration, Utc};
use mercato_shared::types::ShopId;
use rust_decimal::Decimal;

use super::balance::LedgerHead;
use super::entry::{FlowDirection, MoneyFlowEntry};
use super::error::LedgerError;

/// Decimal places a stored amount keeps.
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// How far an explicit timestamp may run ahead of the ledger clock.
pub const MAX_CLOCK_SKEW_SECS: i64 = 5;

/// Input for appending a money-flow entry.
#[derive(Debug, Clone)]
pub struct AppendInput {
    /// In or out.
    pub direction: FlowDirection,
    /// Amount; must not be negative.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Explicit timestamp for ordered imports; `None` stamps the append time.
    pub recorded_at: Option<DateTime<Utc>>,
}

impl AppendInput {
    /// Creates an input stamped at append time.
    #[must_use]
    pub fn new(direction: FlowDirection, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            direction,
            amount,
            description: description.into(),
            recorded_at: None,
        }
    }

    /// Sets an explicit timestamp for ordered imports.
    ///
    /// It must not predate the ledger tail or lie in the future.
    #[must_use]
    pub fn recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(at);
        self
    }
}

/// A validated entry waiting for its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    /// In or out.
    pub direction: FlowDirection,
    /// Non-negative amount.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Balance after this entry.
    pub balance_after: Decimal,
    /// Timestamp to record.
    pub created_at: DateTime<Utc>,
}

impl PendingEntry {
    /// Attaches the store-assigned id and scope.
    #[must_use]
    pub fn into_entry(self, id: i64, shop_id: ShopId) -> MoneyFlowEntry {
        MoneyFlowEntry {
            id,
            shop_id,
            description: self.description,
            direction: self.direction,
            amount: self.amount,
            balance_after: self.balance_after,
            created_at: self.created_at,
        }
    }
}

/// Ledger service for append validation.
pub struct LedgerService;

impl LedgerService {
    /// Validates an optional amount from an outer surface.
    ///
    /// # Errors
    ///
    /// Returns `MissingAmount` for `None`, otherwise whatever
    /// [`Self::validate_amount`] rejects.
    pub fn require_amount(amount: Option<Decimal>) -> Result<Decimal, LedgerError> {
        let amount = amount.ok_or(LedgerError::MissingAmount)?;
        Self::validate_amount(amount)?;
        Ok(amount)
    }

    /// Validates an entry amount.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount` if the amount is below zero, and
    /// `ExcessivePrecision` past [`MAX_AMOUNT_SCALE`] decimal places.
    pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(LedgerError::NegativeAmount);
        }
        if amount.normalize().scale() > MAX_AMOUNT_SCALE {
            return Err(LedgerError::ExcessivePrecision(amount));
        }
        Ok(())
    }

    /// Validates a query range; `start == end` is an empty, valid range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `start > end`.
    pub fn validate_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), LedgerError> {
        if start > end {
            return Err(LedgerError::InvalidRange { start, end });
        }
        Ok(())
    }

    /// Computes the entry to append against the current `head`.
    ///
    /// 1. Validates the amount
    /// 2. Picks the timestamp: explicit `recorded_at` must lie between the
    ///    tail and `now` (plus [`MAX_CLOCK_SKEW_SECS`]); the wall clock is
    ///    clamped up to the tail
    /// 3. Computes `balance_after = head.balance ± amount`
    ///
    /// # Errors
    ///
    /// Returns an amount validation error, `BackdatedEntry`, `FutureEntry`,
    /// or `AmountOverflow` when the balance leaves the decimal range.
    pub fn prepare_append(
        head: &LedgerHead,
        input: AppendInput,
        now: DateTime<Utc>,
    ) -> Result<PendingEntry, LedgerError> {
        Self::validate_amount(input.amount)?;

        let latest_allowed = now + Duration::seconds(MAX_CLOCK_SKEW_SECS);
        let created_at = match (input.recorded_at, head.last_recorded_at) {
            (Some(recorded_at), _) if recorded_at > latest_allowed => {
                return Err(LedgerError::FutureEntry { recorded_at, now });
            }
            (Some(recorded_at), Some(tail_at)) if recorded_at < tail_at => {
                return Err(LedgerError::BackdatedEntry {
                    recorded_at,
                    tail_at,
                });
            }
            (Some(recorded_at), _) => recorded_at,
            (None, Some(tail_at)) => now.max(tail_at),
            (None, None) => now,
        };

        let balance_after = head
            .balance
            .checked_add(input.direction.signed(input.amount))
            .ok_or(LedgerError::AmountOverflow)?;

        Ok(PendingEntry {
            balance_after,
            direction: input.direction,
            amount: input.amount,
            description: input.description,
            created_at,
        })
    }
}
