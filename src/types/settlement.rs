//! Settlement instruction types
//!
//! A settlement is one "X pays Y amount Z" instruction emitted by the
//! planner. A [`Plan`] is the ordered list of instructions for one group
//! together with the condition the planner finished in.

use super::error::SettlementError;
use super::money::Cents;
use super::obligation::{Participant, ParticipantPair};
use std::fmt;

/// One point-to-point payment instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// The paying participant (a net debtor)
    pub from: Participant,

    /// The receiving participant (a net creditor)
    pub to: Participant,

    /// Amount to transfer, at least one cent
    pub amount: Cents,
}

impl Settlement {
    /// The payer → payee pair, as used by write-backs
    pub fn pair(&self) -> ParticipantPair {
        ParticipantPair::new(self.from.id.clone(), self.to.id.clone())
    }
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pays {} {}", self.from, self.to, self.amount)
    }
}

/// How the planner finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanCondition {
    /// Every balance was brought to zero
    Complete,

    /// The planner ran out of non-self pairs with money still unsettled
    Degenerate {
        /// Unsettled magnitude left on the debtor side
        residual: Cents,
    },
}

/// Ordered settlement instructions for one balance set
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Instructions in emission order
    pub settlements: Vec<Settlement>,

    pub condition: PlanCondition,
}

impl Plan {
    pub fn empty() -> Self {
        Plan {
            settlements: Vec::new(),
            condition: PlanCondition::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.condition == PlanCondition::Complete
    }

    /// The partial-plan condition as an error, if the plan is degenerate
    pub fn degenerate_error(&self) -> Option<SettlementError> {
        match self.condition {
            PlanCondition::Complete => None,
            PlanCondition::Degenerate { residual } => Some(SettlementError::planning_degenerate(
                self.settlements.len(),
                residual,
            )),
        }
    }

    /// Total amount moved by the plan
    pub fn total(&self) -> Cents {
        self.settlements.iter().map(|s| s.amount).sum()
    }
}
