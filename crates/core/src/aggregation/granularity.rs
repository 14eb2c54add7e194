//! Bucket granularity selection, calendar alignment, and period labels.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Width of an aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One-minute buckets.
    Minute,
    /// One-hour buckets.
    Hour,
    /// Calendar-day buckets (UTC midnight).
    Day,
    /// ISO weeks starting Monday 00:00 UTC.
    Week,
    /// Calendar months.
    Month,
    /// Calendar years.
    Year,
}

impl Granularity {
    /// All granularities, finest first.
    pub const ALL: [Self; 6] = [
        Self::Minute,
        Self::Hour,
        Self::Day,
        Self::Week,
        Self::Month,
        Self::Year,
    ];

    /// Picks the granularity for a query range of length `duration`.
    ///
    /// | Duration    | Granularity |
    /// |-------------|-------------|
    /// | ≤ 1 hour    | minute      |
    /// | ≤ 24 hours  | hour        |
    /// | ≤ 30 days   | day         |
    /// | ≤ 180 days  | week        |
    /// | ≤ 365 days  | month       |
    /// | otherwise   | year        |
    #[must_use]
    pub fn for_duration(duration: Duration) -> Self {
        if duration <= Duration::hours(1) {
            Self::Minute
        } else if duration <= Duration::hours(24) {
            Self::Hour
        } else if duration <= Duration::days(30) {
            Self::Day
        } else if duration <= Duration::days(180) {
            Self::Week
        } else if duration <= Duration::days(365) {
            Self::Month
        } else {
            Self::Year
        }
    }

    /// Returns true when buckets of this width carry their constituent entries.
    #[must_use]
    pub const fn includes_entries(self) -> bool {
        matches!(self, Self::Minute | Self::Hour)
    }

    /// Returns the start of the bucket containing `at`.
    #[must_use]
    pub fn truncate(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let day_start = at.date_naive().and_time(NaiveTime::MIN).and_utc();
        match self {
            Self::Minute => {
                day_start
                    + Duration::hours(i64::from(at.hour()))
                    + Duration::minutes(i64::from(at.minute()))
            }
            Self::Hour => day_start + Duration::hours(i64::from(at.hour())),
            Self::Day => day_start,
            Self::Week => {
                day_start - Duration::days(i64::from(at.weekday().num_days_from_monday()))
            }
            Self::Month => day_start - Duration::days(i64::from(at.day0())),
            Self::Year => day_start - Duration::days(i64::from(at.ordinal0())),
        }
    }

    /// Formats the label of the bucket starting at `period_start`.
    #[must_use]
    pub fn label(self, period_start: DateTime<Utc>) -> String {
        let pattern = match self {
            Self::Minute => "%Y-%m-%d %H:%M",
            Self::Hour => "%Y-%m-%d %H:00",
            Self::Day => "%Y-%m-%d",
            Self::Week => "%G-W%V",
            Self::Month => "%Y-%m",
            Self::Year => "%Y",
        };
        period_start.format(pattern).to_string()
    }

    /// Returns the lowercase name, also the PostgreSQL `date_trunc` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LedgerError::UnknownGranularity(s.to_string()))
    }
}
