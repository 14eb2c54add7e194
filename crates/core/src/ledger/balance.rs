//! Ledger head tracking and balance-chain auditing.
//!
//! The head is the explicit tail state of a shop ledger: current balance,
//! last entry, and a version counter. It is advanced in the same atomic
//! write as the entry it describes, so appends never depend on "whichever row
//! has the latest timestamp".

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::MoneyFlowEntry;
use super::error::LedgerError;

/// Tail state of a shop ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerHead {
    /// Balance after the latest entry.
    pub balance: Decimal,
    /// Id of the latest entry, if any.
    pub last_entry_id: Option<i64>,
    /// Timestamp of the latest entry, if any.
    pub last_recorded_at: Option<DateTime<Utc>>,
    /// Number of entries applied (monotonically increasing).
    pub version: i64,
}

impl Default for LedgerHead {
    fn default() -> Self {
        Self::empty()
    }
}

impl LedgerHead {
    /// Head of a ledger with no entries.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            balance: Decimal::ZERO,
            last_entry_id: None,
            last_recorded_at: None,
            version: 0,
        }
    }

    /// Returns the head after `entry` has been applied.
    ///
    /// current_balance[N] = balance_after of entry N, version[N] = version[N-1] + 1.
    #[must_use]
    pub fn advance(&self, entry: &MoneyFlowEntry) -> Self {
        Self {
            balance: entry.balance_after,
            last_entry_id: Some(entry.id),
            last_recorded_at: Some(entry.created_at),
            version: self.version + 1,
        }
    }
}

/// Head and entries of one ledger, read together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// Ledger head at the time of the read.
    pub head: LedgerHead,
    /// Every entry up to that head, ordered by `(created_at, id)`.
    pub entries: Vec<MoneyFlowEntry>,
}

/// Outcome of a successful balance-chain audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Number of entries walked.
    pub entries_checked: usize,
    /// Balance implied by the running sum (equals the stored head balance).
    pub balance: Decimal,
}

/// Sums the signed amounts of `entries`, independent of stored balances.
///
/// # Errors
///
/// Returns `AmountOverflow` if the sum leaves the decimal range.
pub fn running_sum(entries: &[MoneyFlowEntry]) -> Result<Decimal, LedgerError> {
    entries.iter().try_fold(Decimal::ZERO, |sum, entry| {
        sum.checked_add(entry.signed_amount())
            .ok_or(LedgerError::AmountOverflow)
    })
}

/// Walks `entries` (ordered by `(created_at, id)`) and checks every stored
/// `balance_after` against the running sum, then checks the head.
///
/// Nothing is corrected; the first mismatch is returned.
///
/// # Errors
///
/// Returns `LedgerError::InconsistentState` naming the first offending entry.
pub fn verify_chain(
    entries: &[MoneyFlowEntry],
    head: &LedgerHead,
) -> Result<AuditReport, LedgerError> {
    let mut expected = Decimal::ZERO;
    let mut previous_key = None;

    for entry in entries {
        if previous_key.is_some_and(|key| key > entry.order_key()) {
            return Err(LedgerError::InconsistentState {
                entry_id: entry.id,
                expected,
                actual: entry.balance_after,
            });
        }
        previous_key = Some(entry.order_key());

        let Some(next) = expected.checked_add(entry.signed_amount()) else {
            return Err(LedgerError::InconsistentState {
                entry_id: entry.id,
                expected,
                actual: entry.balance_after,
            });
        };
        expected = next;
        if entry.balance_after != expected {
            return Err(LedgerError::InconsistentState {
                entry_id: entry.id,
                expected,
                actual: entry.balance_after,
            });
        }
    }

    let entry_count = i64::try_from(entries.len()).unwrap_or(i64::MAX);
    if head.balance != expected || head.version != entry_count {
        return Err(LedgerError::InconsistentState {
            entry_id: head.last_entry_id.unwrap_or(0),
            expected,
            actual: head.balance,
        });
    }

    Ok(AuditReport {
        entries_checked: entries.len(),
        balance: expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::FlowDirection;
    use crate::ledger::service::{AppendInput, LedgerService};
    use chrono::{Duration, TimeZone};
    use mercato_shared::types::ShopId;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    /// Appends (direction, amount) pairs through the production append path.
    fn build_chain(flows: &[(FlowDirection, Decimal)]) -> (Vec<MoneyFlowEntry>, LedgerHead) {
        let shop_id = ShopId::new();
        let mut head = LedgerHead::empty();
        let mut entries = Vec::with_capacity(flows.len());
        for (i, (direction, amount)) in flows.iter().enumerate() {
            let id = i64::try_from(i).unwrap() + 1;
            let at = base_time() + Duration::minutes(id);
            let entry = LedgerService::prepare_append(
                &head,
                AppendInput::new(*direction, *amount, format!("flow {id}")).recorded_at(at),
                at,
            )
            .unwrap()
            .into_entry(id, shop_id);
            head = head.advance(&entry);
            entries.push(entry);
        }
        (entries, head)
    }

    fn flow_strategy() -> impl Strategy<Value = (FlowDirection, Decimal)> {
        (
            prop_oneof![Just(FlowDirection::In), Just(FlowDirection::Out)],
            (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        )
    }

    #[test]
    fn test_empty_ledger_audits_clean() {
        let report = verify_chain(&[], &LedgerHead::empty()).unwrap();
        assert_eq!(report.entries_checked, 0);
        assert_eq!(report.balance, Decimal::ZERO);
    }

    #[test]
    fn test_advance_tracks_tail() {
        let (entries, head) = build_chain(&[
            (FlowDirection::In, dec!(100)),
            (FlowDirection::Out, dec!(30)),
        ]);
        assert_eq!(head.balance, dec!(70));
        assert_eq!(head.version, 2);
        assert_eq!(head.last_entry_id, Some(entries[1].id));
        assert_eq!(head.last_recorded_at, Some(entries[1].created_at));
    }

    #[test]
    fn test_corrupted_entry_is_reported_not_corrected() {
        let (mut entries, head) = build_chain(&[
            (FlowDirection::In, dec!(100)),
            (FlowDirection::Out, dec!(30)),
            (FlowDirection::In, dec!(20)),
        ]);
        entries[1].balance_after = dec!(75);

        let err = verify_chain(&entries, &head).unwrap_err();
        match err {
            LedgerError::InconsistentState {
                entry_id,
                expected,
                actual,
            } => {
                assert_eq!(entry_id, 2);
                assert_eq!(expected, dec!(70));
                assert_eq!(actual, dec!(75));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(entries[1].balance_after, dec!(75));
    }

    #[test]
    fn test_head_disagreeing_with_chain_is_reported() {
        let (entries, mut head) = build_chain(&[(FlowDirection::In, dec!(10))]);
        head.balance = dec!(11);

        assert!(matches!(
            verify_chain(&entries, &head),
            Err(LedgerError::InconsistentState { entry_id: 1, .. })
        ));
    }

    #[test]
    fn test_out_of_order_chain_is_reported() {
        let (mut entries, head) = build_chain(&[
            (FlowDirection::In, dec!(10)),
            (FlowDirection::In, dec!(10)),
        ]);
        entries[1].created_at = base_time() - Duration::days(1);

        assert!(verify_chain(&entries, &head).is_err());
    }

    #[test]
    fn test_overflowing_chain_is_reported_not_panicked() {
        let (mut entries, head) = build_chain(&[
            (FlowDirection::In, dec!(10)),
            (FlowDirection::In, dec!(10)),
        ]);
        entries[0].amount = Decimal::MAX;
        entries[1].amount = Decimal::MAX;
        entries[0].balance_after = Decimal::MAX;

        assert!(matches!(
            verify_chain(&entries, &head),
            Err(LedgerError::InconsistentState { entry_id: 2, .. })
        ));
        assert!(matches!(
            running_sum(&entries),
            Err(LedgerError::AmountOverflow)
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Current balance equals the independent sum of signed amounts.
        #[test]
        fn prop_head_balance_equals_sum_of_signed_amounts(
            flows in prop::collection::vec(flow_strategy(), 0..40),
        ) {
            let (entries, head) = build_chain(&flows);
            let sum: Decimal = flows
                .iter()
                .map(|(direction, amount)| direction.signed(*amount))
                .sum();
            prop_assert_eq!(head.balance, sum);
            prop_assert_eq!(running_sum(&entries).unwrap(), sum);
        }

        /// entries[i+1].balance_after == entries[i].balance_after ± amount.
        #[test]
        fn prop_chain_is_monotonic(
            flows in prop::collection::vec(flow_strategy(), 2..40),
        ) {
            let (entries, _) = build_chain(&flows);
            prop_assert_eq!(entries[0].balance_after, entries[0].signed_amount());
            for pair in entries.windows(2) {
                prop_assert_eq!(
                    pair[1].balance_after,
                    pair[0].balance_after + pair[1].signed_amount()
                );
            }
        }

        /// Well-formed chains always audit clean, and the version counts entries.
        #[test]
        fn prop_well_formed_chain_verifies(
            flows in prop::collection::vec(flow_strategy(), 0..40),
        ) {
            let (entries, head) = build_chain(&flows);
            let report = verify_chain(&entries, &head).unwrap();
            prop_assert_eq!(report.entries_checked, flows.len());
            prop_assert_eq!(head.version as usize, flows.len());
        }
    }
}
