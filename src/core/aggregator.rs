//! Balance aggregation
//!
//! This module provides the `BalanceAggregator`, which reduces a group's
//! pending obligations into one net balance per participant.
//!
//! The aggregator is responsible for:
//! - Ignoring obligations that are no longer pending
//! - Counting each obligation id once
//! - Skipping and reporting invalid obligations (self-obligations,
//!   non-positive amounts)
//! - Dropping participants whose net position is below one cent
//! - Checking that credits and debits cancel out before emitting anything

use crate::types::{
    balance_totals, Balance, Cents, InvalidReason, Obligation, ObligationId, Participant,
    ParticipantId, SettlementError,
};
use std::collections::{BTreeMap, HashSet};

/// Output of a successful aggregation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregation {
    /// Non-zero net balances, ordered by participant id
    pub balances: Vec<Balance>,

    /// Obligations that were skipped, with the reason
    pub warnings: Vec<SettlementError>,
}

/// Running position of one participant during a reduction
#[derive(Debug)]
struct Accumulator {
    participant: Participant,
    net: Cents,
}

/// Reduces pending obligations into net balances
///
/// Stateless: every call starts from an empty map, so balances are always
/// derived from the raw obligations passed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceAggregator;

impl BalanceAggregator {
    pub fn new() -> Self {
        BalanceAggregator
    }

    /// Aggregate obligations into net balances
    ///
    /// # Arguments
    ///
    /// * `obligations` - Obligations in any order; settled ones are ignored
    ///
    /// # Returns
    ///
    /// * `Ok(Aggregation)` - Balances that sum to zero, plus skipped-obligation warnings
    /// * `Err(SettlementError)` - The input could not be netted consistently
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A running balance overflows (`ArithmeticOverflow`)
    /// - Credits and debits differ by a cent or more (`AggregationInconsistency`)
    pub fn aggregate(&self, obligations: &[Obligation]) -> Result<Aggregation, SettlementError> {
        let mut accounts: BTreeMap<ParticipantId, Accumulator> = BTreeMap::new();
        let mut seen: HashSet<ObligationId> = HashSet::new();
        let mut warnings = Vec::new();

        for obligation in obligations.iter().filter(|o| o.is_pending()) {
            if !seen.insert(obligation.id) {
                warnings.push(skip(obligation, InvalidReason::DuplicateId));
                continue;
            }

            if obligation.is_self_obligation() {
                warnings.push(skip(obligation, InvalidReason::SelfObligation));
                continue;
            }

            if !obligation.amount.is_positive() {
                warnings.push(skip(
                    obligation,
                    InvalidReason::NonPositiveAmount(obligation.amount),
                ));
                continue;
            }

            apply(&mut accounts, &obligation.creditor, obligation.amount, "credit")?;
            apply(&mut accounts, &obligation.debtor, -obligation.amount, "debit")?;
        }

        let balances: Vec<Balance> = accounts
            .into_values()
            .filter(|acc| !acc.net.is_negligible())
            .map(|acc| Balance::new(acc.participant, acc.net))
            .collect();

        check_conservation(&balances)?;

        tracing::debug!(
            participants = balances.len(),
            skipped = warnings.len(),
            "aggregated obligations"
        );

        Ok(Aggregation { balances, warnings })
    }
}

/// Verify that a balance set nets to zero
///
/// # Errors
///
/// `AggregationInconsistency` when the credit and debit totals differ by at
/// least one cent, or cannot be computed.
pub fn check_conservation(balances: &[Balance]) -> Result<(), SettlementError> {
    let (credits, debits) = balance_totals(balances)
        .ok_or_else(|| SettlementError::aggregation_inconsistency(Cents::ZERO, Cents::ZERO))?;

    let drift = credits
        .checked_sub(debits)
        .map(Cents::abs)
        .unwrap_or(Cents::new(i64::MAX));

    if drift < Cents::EPSILON {
        Ok(())
    } else {
        tracing::error!(%credits, %debits, "net balances do not sum to zero");
        Err(SettlementError::aggregation_inconsistency(credits, debits))
    }
}

fn apply(
    accounts: &mut BTreeMap<ParticipantId, Accumulator>,
    participant: &Participant,
    delta: Cents,
    operation: &str,
) -> Result<(), SettlementError> {
    let account = accounts
        .entry(participant.id.clone())
        .or_insert_with(|| Accumulator {
            participant: participant.clone(),
            net: Cents::ZERO,
        });

    account.net = account
        .net
        .checked_add(delta)
        .ok_or_else(|| SettlementError::arithmetic_overflow(operation, &participant.id))?;

    Ok(())
}

fn skip(obligation: &Obligation, reason: InvalidReason) -> SettlementError {
    let warning = SettlementError::invalid_obligation(obligation.id, reason);
    tracing::warn!(group = %obligation.group, "skipping obligation: {}", warning);
    warning
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObligationStatus;
    use rstest::rstest;

    fn obligation(id: ObligationId, debtor: &str, creditor: &str, cents: i64) -> Obligation {
        Obligation {
            id,
            group: "trip".to_string(),
            debtor: Participant::new(debtor, debtor.to_uppercase()),
            creditor: Participant::new(creditor, creditor.to_uppercase()),
            amount: Cents::new(cents),
            status: ObligationStatus::Pending,
        }
    }

    fn nets(aggregation: &Aggregation) -> Vec<(&str, i64)> {
        aggregation
            .balances
            .iter()
            .map(|b| (b.participant.id.as_str(), b.net.cents()))
            .collect()
    }

    #[test]
    fn test_chain_nets_out_middle_participant() {
        // C requested 30 from B, B requested 30 from A
        let obligations = vec![obligation(1, "b", "c", 3000), obligation(2, "a", "b", 3000)];

        let aggregation = BalanceAggregator::new().aggregate(&obligations).unwrap();

        assert_eq!(nets(&aggregation), vec![("a", -3000), ("c", 3000)]);
        assert!(aggregation.warnings.is_empty());
    }

    #[test]
    fn test_cycle_produces_no_balances() {
        let obligations = vec![
            obligation(1, "a", "b", 1000),
            obligation(2, "b", "c", 1000),
            obligation(3, "c", "a", 1000),
        ];

        let aggregation = BalanceAggregator::new().aggregate(&obligations).unwrap();

        assert!(aggregation.balances.is_empty());
    }

    #[test]
    fn test_balances_ordered_by_participant_id() {
        let obligations = vec![obligation(1, "zed", "amy", 100), obligation(2, "kim", "amy", 100)];

        let aggregation = BalanceAggregator::new().aggregate(&obligations).unwrap();

        assert_eq!(
            nets(&aggregation),
            vec![("amy", 200), ("kim", -100), ("zed", -100)]
        );
    }

    #[test]
    fn test_settled_obligations_are_ignored() {
        let mut settled = obligation(1, "a", "b", 5000);
        settled.status = ObligationStatus::Settled;

        let aggregation = BalanceAggregator::new().aggregate(&[settled]).unwrap();

        assert!(aggregation.balances.is_empty());
        assert!(aggregation.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_ids_counted_once() {
        let obligations = vec![obligation(1, "a", "b", 5000), obligation(1, "a", "b", 5000)];

        let aggregation = BalanceAggregator::new().aggregate(&obligations).unwrap();

        assert_eq!(nets(&aggregation), vec![("a", -5000), ("b", 5000)]);
        assert_eq!(
            aggregation.warnings,
            vec![SettlementError::invalid_obligation(
                1,
                InvalidReason::DuplicateId
            )]
        );
    }

    #[rstest]
    #[case::self_obligation(obligation(1, "a", "a", 1000), InvalidReason::SelfObligation)]
    #[case::zero_amount(obligation(1, "a", "b", 0), InvalidReason::NonPositiveAmount(Cents::ZERO))]
    #[case::negative_amount(
        obligation(1, "a", "b", -250),
        InvalidReason::NonPositiveAmount(Cents::new(-250))
    )]
    fn test_invalid_obligation_skipped_and_reported(
        #[case] invalid: Obligation,
        #[case] reason: InvalidReason,
    ) {
        let obligations = vec![invalid, obligation(2, "c", "d", 700)];

        let aggregation = BalanceAggregator::new().aggregate(&obligations).unwrap();

        assert_eq!(nets(&aggregation), vec![("c", -700), ("d", 700)]);
        assert_eq!(
            aggregation.warnings,
            vec![SettlementError::invalid_obligation(1, reason)]
        );
    }

    #[test]
    fn test_sub_cent_amount_yields_no_balances() {
        let amount: Cents = "0.005".parse().unwrap();
        let obligations = vec![obligation(1, "a", "b", amount.cents())];

        let aggregation = BalanceAggregator::new().aggregate(&obligations).unwrap();

        assert!(aggregation.balances.is_empty());
        assert_eq!(aggregation.warnings.len(), 1);
    }

    #[test]
    fn test_first_label_wins() {
        let mut second = obligation(2, "a", "c", 100);
        second.debtor.label = "Alias".to_string();
        let obligations = vec![obligation(1, "a", "b", 100), second];

        let aggregation = BalanceAggregator::new().aggregate(&obligations).unwrap();

        assert_eq!(aggregation.balances[0].participant.label, "A");
    }

    #[test]
    fn test_overflow_fails_closed() {
        let obligations = vec![
            obligation(1, "a", "b", i64::MAX),
            obligation(2, "c", "b", 1),
        ];

        let result = BalanceAggregator::new().aggregate(&obligations);

        assert!(matches!(
            result,
            Err(SettlementError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        let aggregation = BalanceAggregator::new().aggregate(&[]).unwrap();
        assert_eq!(aggregation, Aggregation::default());
    }

    #[test]
    fn test_check_conservation_rejects_unbalanced_set() {
        let balances = vec![
            Balance::new(Participant::new("a", "A"), Cents::new(-3000)),
            Balance::new(Participant::new("b", "B"), Cents::new(2999)),
        ];

        assert_eq!(
            check_conservation(&balances),
            Err(SettlementError::aggregation_inconsistency(
                Cents::new(2999),
                Cents::new(3000)
            ))
        );
    }
}
