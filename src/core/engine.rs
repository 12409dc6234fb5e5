//! Settlement engine
//!
//! This module provides the `SettlementEngine` that runs the two-stage
//! pipeline for one group:
//!
//! ```text
//! Obligation[] -> BalanceAggregator -> Balance[] -> SettlementPlanner -> Settlement[]
//! ```
//!
//! The engine enforces the inconsistency policy chosen by the caller. It
//! only reads from an [`ObligationStore`]; confirmed reports are applied
//! with [`ObligationStore::confirm_report`]. It holds no state between
//! calls; two calls on the same snapshot give the same report.

use crate::core::aggregator::BalanceAggregator;
use crate::core::planner::SettlementPlanner;
use crate::core::traits::ObligationStore;
use crate::types::{
    Balance, Cents, GroupId, Obligation, PlanCondition, Settlement, SettlementError,
};

/// What to do when a group's balances fail the conservation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InconsistencyPolicy {
    /// Surface the error; the group needs manual reconciliation
    #[default]
    Reject,

    /// Report "nothing to settle" and, on confirmation, mark every valid
    /// pending obligation of the group settled
    MarkAllSettled,
}

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub inconsistency_policy: InconsistencyPolicy,
}

/// How a group's computation ended
#[derive(Debug, Clone, PartialEq)]
pub enum ReportStatus {
    /// The plan brings every balance to zero
    Balanced,

    /// The planner stopped early; `residual` is still owed
    Partial { residual: Cents },

    /// Balances were inconsistent and the `MarkAllSettled` policy applied
    Inconsistent { error: SettlementError },
}

/// Result of settling one group
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementReport {
    pub group: GroupId,

    /// Net balances the plan was computed from
    pub balances: Vec<Balance>,

    /// Payment instructions in emission order
    pub settlements: Vec<Settlement>,

    /// Obligations skipped during aggregation
    pub warnings: Vec<SettlementError>,

    pub status: ReportStatus,
}

impl SettlementReport {
    fn inconsistent(group: &str, warnings: Vec<SettlementError>, error: SettlementError) -> Self {
        SettlementReport {
            group: group.to_string(),
            balances: Vec::new(),
            settlements: Vec::new(),
            warnings,
            status: ReportStatus::Inconsistent { error },
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.status == ReportStatus::Balanced
    }
}

/// Result of processing one group inside a multi-group run
#[derive(Debug, Clone)]
pub struct GroupOutcome {
    pub group: GroupId,

    /// The group's report, or why it could not be produced
    pub result: Result<SettlementReport, SettlementError>,

    /// Obligations marked settled when the plan was confirmed
    pub confirmed: usize,
}

/// Settlement engine
///
/// Orchestrates aggregation and planning for one group at a time.
#[derive(Debug, Clone, Default)]
pub struct SettlementEngine {
    aggregator: BalanceAggregator,
    planner: SettlementPlanner,
    config: EngineConfig,
}

impl SettlementEngine {
    /// Create a new SettlementEngine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        SettlementEngine {
            aggregator: BalanceAggregator::new(),
            planner: SettlementPlanner::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the settlement report for a snapshot of a group's obligations
    ///
    /// # Arguments
    ///
    /// * `group` - The group the snapshot belongs to
    /// * `obligations` - The group's obligations; settled ones are ignored
    ///
    /// # Returns
    ///
    /// * `Ok(SettlementReport)` - Balances, settlements and skipped obligations
    /// * `Err(SettlementError)` - The balances are inconsistent and the
    ///   policy is `Reject`
    pub fn compute(
        &self,
        group: &str,
        obligations: &[Obligation],
    ) -> Result<SettlementReport, SettlementError> {
        let aggregation = match self.aggregator.aggregate(obligations) {
            Ok(aggregation) => aggregation,
            Err(e) => return self.on_inconsistency(group, Vec::new(), e),
        };

        let plan = match self.planner.plan(&aggregation.balances) {
            Ok(plan) => plan,
            Err(e) => return self.on_inconsistency(group, aggregation.warnings, e),
        };

        let status = match plan.condition {
            PlanCondition::Complete => ReportStatus::Balanced,
            PlanCondition::Degenerate { residual } => {
                tracing::warn!(group, %residual, "returning partial settlement plan");
                ReportStatus::Partial { residual }
            }
        };

        tracing::info!(
            group,
            participants = aggregation.balances.len(),
            settlements = plan.settlements.len(),
            skipped = aggregation.warnings.len(),
            "computed settlement plan"
        );

        Ok(SettlementReport {
            group: group.to_string(),
            balances: aggregation.balances,
            settlements: plan.settlements,
            warnings: aggregation.warnings,
            status,
        })
    }

    /// Fetch a group's pending obligations from the store and compute its report
    ///
    /// # Errors
    ///
    /// Returns an error if the group is unknown to the store, or if the
    /// balances are inconsistent and the policy is `Reject`.
    pub fn settle_group<S: ObligationStore + ?Sized>(
        &self,
        store: &S,
        group: &str,
    ) -> Result<SettlementReport, SettlementError> {
        let obligations = store.fetch_pending_obligations(group)?;
        self.compute(group, &obligations)
    }

    fn on_inconsistency(
        &self,
        group: &str,
        warnings: Vec<SettlementError>,
        error: SettlementError,
    ) -> Result<SettlementReport, SettlementError> {
        if !error.is_inconsistency() {
            return Err(error);
        }

        match self.config.inconsistency_policy {
            InconsistencyPolicy::Reject => {
                tracing::error!(group, %error, "group requires manual reconciliation");
                Err(error)
            }
            InconsistencyPolicy::MarkAllSettled => {
                tracing::warn!(group, %error, "treating inconsistent group as having nothing to settle");
                Ok(SettlementReport::inconsistent(group, warnings, error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::InMemoryLedger;
    use crate::types::{ObligationId, ObligationStatus, Participant};

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

    fn overflowing() -> Vec<Obligation> {
        vec![obligation(1, "a", "b", i64::MAX), obligation(2, "c", "b", 1)]
    }

    #[test]
    fn test_compute_chain() {
        let engine = SettlementEngine::default();
        let obligations = vec![obligation(1, "b", "c", 3000), obligation(2, "a", "b", 3000)];

        let report = engine.compute("trip", &obligations).unwrap();

        assert_eq!(report.settlements.len(), 1);
        assert_eq!(report.settlements[0].to_string(), "A pays C 30.00");
        assert_eq!(report.status, ReportStatus::Balanced);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let engine = SettlementEngine::default();
        let obligations = vec![
            obligation(1, "a", "b", 5000),
            obligation(2, "a", "c", 5000),
            obligation(3, "d", "c", 1234),
        ];

        let first = engine.compute("trip", &obligations).unwrap();
        let second = engine.compute("trip", &obligations).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_compute_keeps_warnings() {
        let engine = SettlementEngine::default();
        let obligations = vec![obligation(1, "a", "a", 3000), obligation(2, "a", "b", 100)];

        let report = engine.compute("trip", &obligations).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.settlements.len(), 1);
    }

    #[test]
    fn test_reject_policy_surfaces_inconsistency() {
        let engine = SettlementEngine::default();

        let result = engine.compute("trip", &overflowing());

        assert!(matches!(result, Err(e) if e.is_inconsistency()));
    }

    #[test]
    fn test_mark_all_settled_policy_reports_nothing_to_settle() {
        let engine = SettlementEngine::new(EngineConfig {
            inconsistency_policy: InconsistencyPolicy::MarkAllSettled,
        });

        let report = engine.compute("trip", &overflowing()).unwrap();

        assert!(report.settlements.is_empty());
        assert!(report.balances.is_empty());
        assert!(matches!(report.status, ReportStatus::Inconsistent { .. }));
    }

    #[test]
    fn test_settle_group_unknown() {
        let engine = SettlementEngine::default();
        let store = InMemoryLedger::new();

        assert_eq!(
            engine.settle_group(&store, "nope"),
            Err(SettlementError::unknown_group("nope"))
        );
    }
}
