//! Core traits for the settlement engine's storage boundary
//!
//! The engine never owns obligations. It reads pending obligations from an
//! `ObligationStore` and returns a report; when the caller confirms that
//! report, [`ObligationStore::confirm_report`] marks the matching
//! obligations settled.

use crate::core::engine::{ReportStatus, SettlementReport};
use crate::types::{
    Cents, GroupId, Obligation, ObligationId, ParticipantPair, SettlementError,
};

/// Outcome of a pairwise write-back
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteBack {
    /// Obligations marked settled, in the order they were marked
    pub settled: Vec<ObligationId>,

    /// Part of the confirmed amount no direct obligation could absorb
    pub unapplied: Cents,
}

/// Trait for the obligation store the engine reads from and writes back to
///
/// Implementations can be synchronous (using BTreeMap) or shared across
/// tasks (using DashMap).
pub trait ObligationStore {
    /// Groups that have at least one recorded obligation, ascending
    fn groups(&self) -> Vec<GroupId>;

    /// Pending obligations of a group, ascending by id
    ///
    /// # Errors
    ///
    /// `UnknownGroup` if nothing was ever recorded for the group.
    fn fetch_pending_obligations(&self, group: &str) -> Result<Vec<Obligation>, SettlementError>;

    /// Mark pending obligations from `pair.from` to `pair.to` settled
    ///
    /// Obligations are taken in ascending id order while their amount fits in
    /// what is left of `amount`. An obligation is never split.
    fn mark_obligations_settled(
        &mut self,
        group: &str,
        pair: &ParticipantPair,
        amount: Cents,
    ) -> Result<WriteBack, SettlementError>;

    /// Mark every pending obligation of a group settled
    ///
    /// Self-obligations and non-positive amounts are left pending, since the
    /// aggregator never counted them. Returns how many obligations changed
    /// state.
    fn settle_group(&mut self, group: &str) -> Result<usize, SettlementError>;

    /// Apply a confirmed report
    ///
    /// - `Balanced`: each settlement is written back pairwise, then the rest
    ///   of the group is settled, since the plan clears all balances.
    /// - `Partial`: only the pairwise write-backs are applied.
    /// - `Inconsistent`: the rest of the group is settled.
    ///
    /// Returns the number of obligations that changed state.
    fn confirm_report(&mut self, report: &SettlementReport) -> Result<usize, SettlementError> {
        let group = report.group.as_str();

        if let ReportStatus::Inconsistent { error } = &report.status {
            let count = self.settle_group(group)?;
            tracing::warn!(group, count, %error, "marked all obligations settled despite inconsistency");
            return Ok(count);
        }

        let mut count = 0;
        for settlement in &report.settlements {
            let write_back =
                self.mark_obligations_settled(group, &settlement.pair(), settlement.amount)?;
            count += write_back.settled.len();
        }

        if report.is_balanced() {
            count += self.settle_group(group)?;
        }

        Ok(count)
    }
}
