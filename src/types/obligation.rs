//! Obligation-related types for the settlement engine
//!
//! An obligation is a single recorded debt between two members of a group.
//! Obligations are owned by the caller's store; the engine only reads them.

use super::money::Cents;
use std::fmt;

/// Participant identifier, opaque to the engine
pub type ParticipantId = String;

/// Group identifier, opaque to the engine
pub type GroupId = String;

/// Obligation identifier
///
/// Write-backs settle obligations in ascending id order.
pub type ObligationId = u64;

/// A group member as seen by the engine: identifier plus display label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Participant {
    /// Identity used for aggregation and tie-breaking
    pub id: ParticipantId,

    /// Human-readable name, only used for presentation
    pub label: String,
}

impl Participant {
    /// Create a participant, falling back to the id when the label is blank
    pub fn new(id: impl Into<ParticipantId>, label: impl Into<String>) -> Self {
        let id = id.into();
        let label = label.into();
        let label = if label.trim().is_empty() {
            id.clone()
        } else {
            label
        };
        Participant { id, label }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Lifecycle state of an obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObligationStatus {
    /// Still outstanding; participates in aggregation
    Pending,

    /// Paid off; ignored by the engine
    Settled,
}

impl ObligationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ObligationStatus::Pending => "pending",
            ObligationStatus::Settled => "settled",
        }
    }
}

/// A single debt from `debtor` to `creditor`
///
/// The creditor is the member who created the money request.
#[derive(Debug, Clone, PartialEq)]
pub struct Obligation {
    pub id: ObligationId,

    /// Group the obligation was recorded in
    pub group: GroupId,

    /// Who owes the money
    pub debtor: Participant,

    /// Who is owed the money
    pub creditor: Participant,

    /// Amount owed, already truncated to cents
    ///
    /// Validity (strictly positive) is checked by the aggregator, not here,
    /// so that invalid amounts can be reported instead of lost.
    pub amount: Cents,

    pub status: ObligationStatus,
}

impl Obligation {
    pub fn is_pending(&self) -> bool {
        self.status == ObligationStatus::Pending
    }

    pub fn is_self_obligation(&self) -> bool {
        self.debtor.id == self.creditor.id
    }

    /// Whether the aggregator would count this obligation
    ///
    /// Self-obligations and non-positive amounts are skipped with a warning
    /// and must stay pending for someone to review.
    pub fn is_settleable(&self) -> bool {
        !self.is_self_obligation() && self.amount.is_positive()
    }

    /// Whether this obligation runs from `pair.from` to `pair.to`
    pub fn matches(&self, pair: &ParticipantPair) -> bool {
        self.debtor.id == pair.from && self.creditor.id == pair.to
    }
}

/// Directed payer → payee pair used by write-backs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantPair {
    pub from: ParticipantId,
    pub to: ParticipantId,
}

impl ParticipantPair {
    pub fn new(from: impl Into<ParticipantId>, to: impl Into<ParticipantId>) -> Self {
        ParticipantPair {
            from: from.into(),
            to: to.into(),
        }
    }
}
