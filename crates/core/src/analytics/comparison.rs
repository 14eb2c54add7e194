//! Period-over-period comparison.
//!
//! One routine serves every metric: it is parametrized by the fetch
//! function, so the delta rule lives in exactly one place.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use super::types::{ComparisonResult, Metric, Period};
use crate::ledger::{LedgerError, LedgerService};

/// Rounds half-up on the value scaled by 100: `floor(x * 100 + 0.5) / 100`.
///
/// `round2(12.345) == 12.35`, `round2(-12.345) == -12.34`. Values too large
/// to scale carry no fractional cents and come back unchanged.
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    let half = Decimal::new(5, 1);
    value
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_add(half))
        .map_or(value, |scaled| scaled.floor() / Decimal::ONE_HUNDRED)
}

/// Relative change from `previous` to `current`, in percent.
///
/// A zero previous value yields 0 when current is also zero and 100
/// otherwise. A change too large to represent saturates at `Decimal::MAX`
/// or `Decimal::MIN`, keeping its sign.
#[must_use]
pub fn percent_delta(previous: Decimal, current: Decimal) -> Decimal {
    if previous.is_zero() {
        return if current.is_zero() {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        };
    }
    current
        .checked_div(previous)
        .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
        .and_then(|change| change.checked_mul(Decimal::ONE_HUNDRED))
        .map_or_else(
            || {
                if current.is_sign_positive() == previous.is_sign_positive() {
                    Decimal::MAX
                } else {
                    Decimal::MIN
                }
            },
            round2,
        )
}

/// The equal-length window ending where `current` starts, at least one day long.
#[must_use]
pub fn previous_period(current: Period) -> Period {
    let span = (current.end - current.start).max(Duration::days(1));
    Period {
        start: current.start - span,
        end: current.start,
    }
}

/// Fetches `metric` for `[start, end)` and the preceding period, and derives
/// the percent delta.
///
/// # Errors
///
/// Returns `InvalidRange` when `start > end`, or whatever `fetch` returns.
pub async fn compare_range<F, Fut>(
    metric: Metric,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    fetch: F,
) -> Result<ComparisonResult, LedgerError>
where
    F: Fn(DateTime<Utc>, DateTime<Utc>) -> Fut,
    Fut: Future<Output = Result<Decimal, LedgerError>>,
{
    LedgerService::validate_range(start, end)?;

    let current_period = Period { start, end };
    let previous_period = previous_period(current_period);

    let current = fetch(current_period.start, current_period.end).await?;
    let previous = fetch(previous_period.start, previous_period.end).await?;

    Ok(ComparisonResult {
        metric,
        current,
        previous,
        percent_delta: percent_delta(previous, current),
        current_period,
        previous_period,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, day, hour, 0, 0).unwrap()
    }

    #[rstest]
    #[case(dec!(12.345), dec!(12.35))]
    #[case(dec!(12.344), dec!(12.34))]
    #[case(dec!(0.005), dec!(0.01))]
    #[case(dec!(-12.345), dec!(-12.34))]
    #[case(dec!(-12.346), dec!(-12.35))]
    #[case(dec!(50), dec!(50))]
    fn test_round2_is_half_up(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round2(input), expected);
    }

    #[rstest]
    #[case(dec!(0), dec!(0), dec!(0))]
    #[case(dec!(0), dec!(50), dec!(100))]
    #[case(dec!(100), dec!(150), dec!(50))]
    #[case(dec!(200), dec!(150), dec!(-25))]
    #[case(dec!(3), dec!(4), dec!(33.33))]
    #[case(dec!(3), dec!(5), dec!(66.67))]
    #[case(dec!(100), dec!(-10), dec!(-110))]
    fn test_percent_delta(
        #[case] previous: Decimal,
        #[case] current: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(percent_delta(previous, current), expected);
    }

    #[test]
    fn test_percent_delta_saturates_instead_of_overflowing() {
        let huge = Decimal::MAX / dec!(10);
        assert_eq!(percent_delta(dec!(0.0001), huge), Decimal::MAX);
        assert_eq!(percent_delta(dec!(0.0001), -huge), Decimal::MIN);
        assert_eq!(percent_delta(dec!(-0.0001), huge), Decimal::MIN);
        assert_eq!(percent_delta(Decimal::MIN, Decimal::MAX), dec!(-200));
    }

    #[test]
    fn test_round2_leaves_unscalable_values_alone() {
        assert_eq!(round2(Decimal::MAX), Decimal::MAX);
        assert_eq!(round2(Decimal::MIN), Decimal::MIN);
    }

    #[test]
    fn test_previous_period_has_equal_length() {
        let current = Period {
            start: at(10, 0),
            end: at(17, 0),
        };
        assert_eq!(
            previous_period(current),
            Period {
                start: at(3, 0),
                end: at(10, 0),
            }
        );
    }

    #[test]
    fn test_previous_period_is_at_least_one_day() {
        let instant = Period {
            start: at(10, 12),
            end: at(10, 12),
        };
        assert_eq!(
            previous_period(instant),
            Period {
                start: at(9, 12),
                end: at(10, 12),
            }
        );

        let short = Period {
            start: at(10, 12),
            end: at(10, 15),
        };
        assert_eq!(previous_period(short).start, at(9, 12));
    }

    #[tokio::test]
    async fn test_compare_range_fetches_both_periods() {
        let result = compare_range(Metric::Orders, at(10, 0), at(12, 0), |start, _| async move {
            Ok(if start == at(10, 0) { dec!(150) } else { dec!(100) })
        })
        .await
        .unwrap();

        assert_eq!(result.current, dec!(150));
        assert_eq!(result.previous, dec!(100));
        assert_eq!(result.percent_delta, dec!(50));
        assert_eq!(result.previous_period.start, at(8, 0));
    }

    #[tokio::test]
    async fn test_compare_range_rejects_reversed_range() {
        let result = compare_range(Metric::Revenue, at(12, 0), at(10, 0), |_, _| async {
            Ok(Decimal::ZERO)
        })
        .await;
        assert!(matches!(result, Err(LedgerError::InvalidRange { .. })));
    }

    #[test]
    fn test_percent_delta_serializes_as_number() {
        let result = ComparisonResult {
            metric: Metric::Orders,
            current: dec!(150),
            previous: dec!(200),
            percent_delta: dec!(-25),
            current_period: Period {
                start: at(2, 0),
                end: at(3, 0),
            },
            previous_period: Period {
                start: at(1, 0),
                end: at(2, 0),
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["percent_delta"].to_string(), "-25.0");
        assert_eq!(json["current"], "150");
        assert_eq!(json["metric"], "orders");
    }

    proptest! {
        /// Rounded values differ from the input by at most half a cent.
        #[test]
        fn prop_round2_stays_within_half_cent(raw in -1_000_000_000i64..1_000_000_000i64) {
            let value = Decimal::new(raw, 4);
            let rounded = round2(value);
            prop_assert!((rounded - value).abs() <= dec!(0.005));
            prop_assert_eq!(rounded, rounded.round_dp(2));
        }
    }
}
