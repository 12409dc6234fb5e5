//! Thread-safe obligation ledger for multi-group processing
//!
//! This module provides the `AsyncLedger`, which stores obligations per group
//! in a `DashMap` so that tasks working on different groups never contend on
//! a single lock.
//!
//! # Design
//!
//! Each map entry holds one group's obligations ordered by id. Ingesting,
//! fetching and write-backs for a group lock only that group's shard, so the
//! settlement of one group cannot observe a half-applied write-back of the
//! same group, while unrelated groups proceed in parallel.

use crate::core::ledger::{insert_entry, mark_pair, pending, settle_all, GroupEntries};
use crate::core::traits::{ObligationStore, WriteBack};
use crate::types::{Cents, GroupId, Obligation, ParticipantPair, SettlementError};
use dashmap::DashMap;

/// Thread-safe obligation ledger keyed by group
///
/// All methods take `&self` and are safe to call concurrently, typically
/// through an `Arc<AsyncLedger>` shared between tokio tasks.
#[derive(Debug, Default)]
pub struct AsyncLedger {
    /// Per-group obligations
    groups: DashMap<GroupId, GroupEntries>,
}

impl AsyncLedger {
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
        }
    }

    /// Record an obligation
    ///
    /// # Errors
    ///
    /// `InvalidObligation` with `DuplicateId` if the group already holds an
    /// obligation with the same id. The existing obligation is kept.
    pub fn insert(&self, obligation: Obligation) -> Result<(), SettlementError> {
        let mut entries = self.groups.entry(obligation.group.clone()).or_default();
        insert_entry(entries.value_mut(), obligation)
    }

    /// Groups with at least one recorded obligation, ascending
    pub fn groups(&self) -> Vec<GroupId> {
        let mut groups: Vec<GroupId> = self.groups.iter().map(|entry| entry.key().clone()).collect();
        groups.sort();
        groups
    }

    /// Snapshot of a group's pending obligations, ascending by id
    pub fn fetch_pending_obligations(&self, group: &str) -> Result<Vec<Obligation>, SettlementError> {
        self.groups
            .get(group)
            .map(|entries| pending(entries.value()))
            .ok_or_else(|| SettlementError::unknown_group(group))
    }

    /// Mark pending obligations of a pair settled; see [`ObligationStore::mark_obligations_settled`]
    pub fn mark_obligations_settled(
        &self,
        group: &str,
        pair: &ParticipantPair,
        amount: Cents,
    ) -> Result<WriteBack, SettlementError> {
        let mut entries = self
            .groups
            .get_mut(group)
            .ok_or_else(|| SettlementError::unknown_group(group))?;
        Ok(mark_pair(entries.value_mut(), pair, amount))
    }

    /// Mark every valid pending obligation of a group settled
    pub fn settle_group(&self, group: &str) -> Result<usize, SettlementError> {
        let mut entries = self
            .groups
            .get_mut(group)
            .ok_or_else(|| SettlementError::unknown_group(group))?;
        Ok(settle_all(entries.value_mut()))
    }

    /// Every recorded obligation, ordered by group then id
    pub fn obligations(&self) -> Vec<Obligation> {
        self.groups()
            .iter()
            .filter_map(|group| {
                self.groups
                    .get(group)
                    .map(|entries| entries.value().values().cloned().collect::<Vec<_>>())
            })
            .flatten()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Shared handle so write-backs can go through an `Arc<AsyncLedger>`
impl ObligationStore for &AsyncLedger {
    fn groups(&self) -> Vec<GroupId> {
        AsyncLedger::groups(self)
    }

    fn fetch_pending_obligations(&self, group: &str) -> Result<Vec<Obligation>, SettlementError> {
        AsyncLedger::fetch_pending_obligations(self, group)
    }

    fn mark_obligations_settled(
        &mut self,
        group: &str,
        pair: &ParticipantPair,
        amount: Cents,
    ) -> Result<WriteBack, SettlementError> {
        AsyncLedger::mark_obligations_settled(self, group, pair, amount)
    }

    fn settle_group(&mut self, group: &str) -> Result<usize, SettlementError> {
        AsyncLedger::settle_group(self, group)
    }
}
