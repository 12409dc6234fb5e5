//! Group-partitioned processing for concurrent settlement runs
//!
//! This module provides the `GroupProcessor`, which ingests obligations into
//! a shared [`AsyncLedger`] and settles every group in its own tokio task.
//!
//! # Design
//!
//! Groups are independent: a group's plan depends only on its own snapshot
//! of pending obligations. The processor therefore partitions work by group
//! id. Obligations of one group keep their input order, so the first of two
//! obligations sharing an id is always the one recorded.
//!
//! # Architecture
//!
//! ```text
//! GroupProcessor
//!     ├── Arc<SettlementEngine>  (pure, shared by all tasks)
//!     └── Arc<AsyncLedger>       (per-group locking)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::AsyncLedger;
use crate::core::engine::{GroupOutcome, SettlementEngine};
use crate::core::traits::ObligationStore;
use crate::types::{GroupId, Obligation, SettlementError};

/// Concurrent multi-group processor
#[derive(Debug, Clone)]
pub struct GroupProcessor {
    engine: Arc<SettlementEngine>,
    ledger: Arc<AsyncLedger>,
}

impl GroupProcessor {
    pub fn new(engine: Arc<SettlementEngine>, ledger: Arc<AsyncLedger>) -> Self {
        Self { engine, ledger }
    }

    pub fn ledger(&self) -> &Arc<AsyncLedger> {
        &self.ledger
    }

    /// Partition a batch of obligations by group id
    ///
    /// # Guarantees
    ///
    /// - Each obligation appears in exactly one partition
    /// - Obligations of each group keep their original order
    pub fn partition_by_group(&self, batch: Vec<Obligation>) -> HashMap<GroupId, Vec<Obligation>> {
        let mut group_batches: HashMap<GroupId, Vec<Obligation>> = HashMap::new();

        for obligation in batch {
            group_batches
                .entry(obligation.group.clone())
                .or_default()
                .push(obligation);
        }

        group_batches
    }

    /// Record one group's obligations in order
    ///
    /// Returns the rejections (duplicate ids); ingestion continues past them.
    pub async fn ingest_group(&self, obligations: Vec<Obligation>) -> Vec<SettlementError> {
        let mut rejected = Vec::new();

        for obligation in obligations {
            if let Err(e) = self.ledger.insert(obligation) {
                tracing::warn!("rejected obligation: {}", e);
                rejected.push(e);
            }
        }

        rejected
    }

    /// Record a batch of obligations, one task per group
    ///
    /// Batches must be ingested one after another to keep per-group order
    /// across batch boundaries.
    pub async fn ingest_batch(&self, batch: Vec<Obligation>) -> Vec<SettlementError> {
        let group_batches = self.partition_by_group(batch);

        let mut tasks = Vec::with_capacity(group_batches.len());
        for (_group, obligations) in group_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(
                async move { processor.ingest_group(obligations).await },
            ));
        }

        let mut rejected = Vec::new();
        for task in tasks {
            match task.await {
                Ok(group_rejected) => rejected.extend(group_rejected),
                Err(e) => tracing::error!("ingest task panicked: {:?}", e),
            }
        }

        rejected
    }

    /// Compute one group's report and optionally confirm it
    pub async fn settle_group(&self, group: GroupId, confirm: bool) -> GroupOutcome {
        let mut store: &AsyncLedger = &self.ledger;
        let result = self.engine.settle_group(&store, &group);

        let confirmed = match (&result, confirm) {
            (Ok(report), true) => {
                match ObligationStore::confirm_report(&mut store, report) {
                    Ok(count) => count,
                    Err(e) => {
                        tracing::error!(group = %group, "write-back failed: {}", e);
                        0
                    }
                }
            }
            _ => 0,
        };

        GroupOutcome {
            group,
            result,
            confirmed,
        }
    }

    /// Settle every group in the ledger concurrently
    ///
    /// # Returns
    ///
    /// One outcome per group, ordered by group id regardless of the order
    /// in which tasks finished.
    pub async fn settle_all(&self, confirm: bool) -> Vec<GroupOutcome> {
        let mut tasks = Vec::new();
        for group in self.ledger.groups() {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.settle_group(group, confirm).await
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!("settlement task panicked: {:?}", e),
            }
        }

        outcomes.sort_by(|a, b| a.group.cmp(&b.group));
        outcomes
    }
}
