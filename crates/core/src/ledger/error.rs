//! Ledger error types for validation, lookup, and consistency failures.
//!
//! Errors fall into four groups: validation (caller input), not-found,
//! inconsistent state (a broken balance chain, surfaced for manual
//! reconciliation), and storage failures.

use chrono::{DateTime, Utc};
use mercato_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger, aggregation, and analytics operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry amount cannot be negative.
    #[error("Entry amount cannot be negative")]
    NegativeAmount,

    /// Entry amount is required.
    #[error("Entry amount is required")]
    MissingAmount,

    /// Entry amount has more decimal places than the ledger stores.
    #[error("Entry amount {0} has more than 4 decimal places")]
    ExcessivePrecision(Decimal),

    /// Balance or sum would leave the representable decimal range.
    #[error("Amount overflows the supported decimal range")]
    AmountOverflow,

    /// Direction is neither `in` nor `out`.
    #[error("Direction must be \"in\" or \"out\", got \"{0}\"")]
    InvalidDirection(String),

    /// Range start is after range end.
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// Range start.
        start: DateTime<Utc>,
        /// Range end.
        end: DateTime<Utc>,
    },

    /// Requested granularity is not one of minute/hour/day/week/month/year.
    #[error("Unknown granularity: {0}")]
    UnknownGranularity(String),

    /// Requested analytics metric is not supported.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Entry would be recorded before the current ledger tail.
    #[error("Entry recorded at {recorded_at} predates ledger tail at {tail_at}")]
    BackdatedEntry {
        /// Requested timestamp.
        recorded_at: DateTime<Utc>,
        /// Timestamp of the latest entry.
        tail_at: DateTime<Utc>,
    },

    /// Explicit timestamp lies ahead of the ledger clock.
    #[error("Entry recorded at {recorded_at} is ahead of the current time {now}")]
    FutureEntry {
        /// Requested timestamp.
        recorded_at: DateTime<Utc>,
        /// Clock reading at append time.
        now: DateTime<Utc>,
    },

    // ========== Lookup Errors ==========
    /// Entry not found in this ledger.
    #[error("Money-flow entry not found: {0}")]
    EntryNotFound(i64),

    // ========== Consistency Errors ==========
    /// Stored balance chain disagrees with the running sum of entries.
    #[error(
        "Balance chain broken at entry {entry_id}: expected balance {expected}, stored {actual}"
    )]
    InconsistentState {
        /// First entry whose stored balance is wrong (0 for the ledger head).
        entry_id: i64,
        /// Balance implied by the running sum.
        expected: Decimal,
        /// Balance actually stored.
        actual: Decimal,
    },

    // ========== Storage Errors ==========
    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::MissingAmount => "MISSING_AMOUNT",
            Self::ExcessivePrecision(_) => "EXCESSIVE_PRECISION",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::InvalidDirection(_) => "INVALID_DIRECTION",
            Self::InvalidRange { .. } => "INVALID_RANGE",
            Self::UnknownGranularity(_) => "UNKNOWN_GRANULARITY",
            Self::UnknownMetric(_) => "UNKNOWN_METRIC",
            Self::BackdatedEntry { .. } => "BACKDATED_ENTRY",
            Self::FutureEntry { .. } => "FUTURE_ENTRY",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::InconsistentState { .. } => "INCONSISTENT_STATE",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NegativeAmount
            | Self::MissingAmount
            | Self::ExcessivePrecision(_)
            | Self::AmountOverflow
            | Self::InvalidDirection(_)
            | Self::InvalidRange { .. }
            | Self::UnknownGranularity(_)
            | Self::UnknownMetric(_)
            | Self::BackdatedEntry { .. }
            | Self::FutureEntry { .. } => 400,

            // 404 Not Found
            Self::EntryNotFound(_) => 404,

            // 500 Internal Server Error
            Self::InconsistentState { .. } | Self::Storage(_) => 500,
        }
    }

    /// Returns true for caller-input errors.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.http_status_code() == 400
    }

    /// Returns true if this error is retryable.
    ///
    /// Nothing in the ledger is retried automatically.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NegativeAmount
            | LedgerError::MissingAmount
            | LedgerError::ExcessivePrecision(_)
            | LedgerError::AmountOverflow
            | LedgerError::InvalidDirection(_)
            | LedgerError::InvalidRange { .. }
            | LedgerError::UnknownGranularity(_)
            | LedgerError::UnknownMetric(_)
            | LedgerError::BackdatedEntry { .. }
            | LedgerError::FutureEntry { .. } => Self::Validation(message),
            LedgerError::EntryNotFound(_) => Self::NotFound(message),
            LedgerError::InconsistentState { .. } => Self::InconsistentState(message),
            LedgerError::Storage(_) => Self::Database(message),
        }
    }
}
