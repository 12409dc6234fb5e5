//! Settlement planning
//!
//! Converts a conservative set of net balances into payment instructions
//! using greedy largest-debtor / largest-creditor matching.
//!
//! # Algorithm
//!
//! ```text
//! Balances:   A: -100   B: +50   C: +50
//!
//! round 1: debtors [A 100]  creditors [B 50, C 50]  -> A pays B 50
//! round 2: debtors [A 50]   creditors [C 50]        -> A pays C 50
//! ```
//!
//! Each round re-sorts both sides by magnitude (ties by participant id),
//! takes the first pair whose participants differ, and moves the smaller
//! of the two magnitudes. At least one side is exhausted per round, so a
//! set of N participants yields at most N - 1 settlements.

use crate::core::aggregator::check_conservation;
use crate::types::{Balance, Cents, Participant, Plan, PlanCondition, Settlement, SettlementError};
use std::cmp::Ordering;

/// One side of the matching: a participant and the magnitude still open
#[derive(Debug, Clone)]
struct Side {
    participant: Participant,
    magnitude: Cents,
}

/// Largest magnitude first, then participant id ascending
fn by_magnitude(a: &Side, b: &Side) -> Ordering {
    b.magnitude
        .cmp(&a.magnitude)
        .then_with(|| a.participant.id.cmp(&b.participant.id))
}

/// Greedy settlement planner
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementPlanner;

impl SettlementPlanner {
    pub fn new() -> Self {
        SettlementPlanner
    }

    /// Plan settlements for a balance set
    ///
    /// # Arguments
    ///
    /// * `balances` - Net balances that sum to zero
    ///
    /// # Returns
    ///
    /// * `Ok(Plan)` - Settlements in emission order. The plan's condition is
    ///   `Degenerate` if the planner had to stop with money unsettled.
    /// * `Err(SettlementError)` - The balances do not sum to zero
    ///
    /// # Errors
    ///
    /// Returns `AggregationInconsistency` if the precondition fails. No
    /// partial plan is produced in that case.
    pub fn plan(&self, balances: &[Balance]) -> Result<Plan, SettlementError> {
        check_conservation(balances)?;

        let mut debtors: Vec<Side> = Vec::new();
        let mut creditors: Vec<Side> = Vec::new();
        for balance in balances.iter().filter(|b| !b.net.is_negligible()) {
            let side = Side {
                participant: balance.participant.clone(),
                magnitude: balance.net.abs(),
            };
            if balance.is_debtor() {
                debtors.push(side);
            } else {
                creditors.push(side);
            }
        }

        let mut settlements = Vec::new();

        while !debtors.is_empty() && !creditors.is_empty() {
            debtors.sort_by(by_magnitude);
            creditors.sort_by(by_magnitude);

            let Some((d, c)) = first_valid_pair(&debtors, &creditors) else {
                let residual: Cents = debtors.iter().map(|s| s.magnitude).sum();
                tracing::warn!(
                    emitted = settlements.len(),
                    %residual,
                    "no valid settlement pair left; stopping with a partial plan"
                );
                return Ok(Plan {
                    settlements,
                    condition: PlanCondition::Degenerate { residual },
                });
            };

            let amount = debtors[d].magnitude.min(creditors[c].magnitude);
            settlements.push(Settlement {
                from: debtors[d].participant.clone(),
                to: creditors[c].participant.clone(),
                amount,
            });

            debtors[d].magnitude -= amount;
            creditors[c].magnitude -= amount;
            if debtors[d].magnitude.is_negligible() {
                debtors.remove(d);
            }
            if creditors[c].magnitude.is_negligible() {
                creditors.remove(c);
            }
        }

        tracing::debug!(settlements = settlements.len(), "planned settlements");

        Ok(Plan {
            settlements,
            condition: PlanCondition::Complete,
        })
    }
}

/// Indices of the first debtor/creditor pair that is not a self-payment
fn first_valid_pair(debtors: &[Side], creditors: &[Side]) -> Option<(usize, usize)> {
    debtors.iter().enumerate().find_map(|(d, debtor)| {
        creditors
            .iter()
            .position(|creditor| creditor.participant.id != debtor.participant.id)
            .map(|c| (d, c))
    })
}
