//! In-memory obligation ledger
//!
//! This module provides the `InMemoryLedger`, a synchronous
//! [`ObligationStore`] keyed by group. It stands in for the caller's
//! persistence layer when the engine runs as a command-line tool.
//!
//! The ledger is responsible for:
//! - Rejecting duplicate obligation ids within a group (first one wins)
//! - Serving pending obligations per group in ascending id order
//! - Applying write-backs when settlements are confirmed

use crate::core::traits::{ObligationStore, WriteBack};
use crate::types::{
    Cents, GroupId, InvalidReason, Obligation, ObligationId, ObligationStatus, ParticipantPair,
    SettlementError,
};
use std::collections::BTreeMap;

/// Obligations of one group, ordered by id
pub(crate) type GroupEntries = BTreeMap<ObligationId, Obligation>;

/// Synchronous obligation ledger
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    groups: BTreeMap<GroupId, GroupEntries>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        InMemoryLedger {
            groups: BTreeMap::new(),
        }
    }

    /// Record an obligation
    ///
    /// # Errors
    ///
    /// `InvalidObligation` with `DuplicateId` if the group already holds an
    /// obligation with the same id. The existing obligation is kept.
    pub fn insert(&mut self, obligation: Obligation) -> Result<(), SettlementError> {
        let entries = self.groups.entry(obligation.group.clone()).or_default();
        insert_entry(entries, obligation)
    }

    /// Every recorded obligation, ordered by group then id
    pub fn obligations(&self) -> Vec<Obligation> {
        self.groups
            .values()
            .flat_map(|entries| entries.values().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn entries_mut(&mut self, group: &str) -> Result<&mut GroupEntries, SettlementError> {
        self.groups
            .get_mut(group)
            .ok_or_else(|| SettlementError::unknown_group(group))
    }
}

impl ObligationStore for InMemoryLedger {
    fn groups(&self) -> Vec<GroupId> {
        self.groups.keys().cloned().collect()
    }

    fn fetch_pending_obligations(&self, group: &str) -> Result<Vec<Obligation>, SettlementError> {
        self.groups
            .get(group)
            .map(pending)
            .ok_or_else(|| SettlementError::unknown_group(group))
    }

    fn mark_obligations_settled(
        &mut self,
        group: &str,
        pair: &ParticipantPair,
        amount: Cents,
    ) -> Result<WriteBack, SettlementError> {
        Ok(mark_pair(self.entries_mut(group)?, pair, amount))
    }

    fn settle_group(&mut self, group: &str) -> Result<usize, SettlementError> {
        Ok(settle_all(self.entries_mut(group)?))
    }
}

pub(crate) fn insert_entry(
    entries: &mut GroupEntries,
    obligation: Obligation,
) -> Result<(), SettlementError> {
    if entries.contains_key(&obligation.id) {
        return Err(SettlementError::invalid_obligation(
            obligation.id,
            InvalidReason::DuplicateId,
        ));
    }
    entries.insert(obligation.id, obligation);
    Ok(())
}

pub(crate) fn pending(entries: &GroupEntries) -> Vec<Obligation> {
    entries.values().filter(|o| o.is_pending()).cloned().collect()
}

pub(crate) fn mark_pair(
    entries: &mut GroupEntries,
    pair: &ParticipantPair,
    amount: Cents,
) -> WriteBack {
    let mut remaining = amount;
    let mut settled = Vec::new();

    for obligation in entries.values_mut() {
        if remaining.is_negligible() {
            break;
        }
        if !obligation.is_pending() || !obligation.matches(pair) {
            continue;
        }
        if obligation.amount.is_positive() && obligation.amount <= remaining {
            obligation.status = ObligationStatus::Settled;
            remaining -= obligation.amount;
            settled.push(obligation.id);
        }
    }

    tracing::debug!(
        from = %pair.from,
        to = %pair.to,
        settled = settled.len(),
        unapplied = %remaining,
        "applied write-back"
    );

    WriteBack {
        settled,
        unapplied: remaining,
    }
}

/// Settle every pending obligation the aggregator would count
///
/// Invalid obligations stay pending.
pub(crate) fn settle_all(entries: &mut GroupEntries) -> usize {
    let mut count = 0;
    for obligation in entries
        .values_mut()
        .filter(|o| o.is_pending() && o.is_settleable())
    {
        obligation.status = ObligationStatus::Settled;
        count += 1;
    }
    count
}
