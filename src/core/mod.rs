//! Core business logic module
//!
//! This module contains the settlement components:
//! - `traits` - The obligation store boundary
//! - `aggregator` - Obligations to net balances
//! - `planner` - Net balances to settlement instructions
//! - `engine` - Per-group orchestration and inconsistency policy
//! - `ledger` - In-memory obligation store
//! - `async` - Concurrent, multi-group implementations

pub mod aggregator;
pub mod r#async;
pub mod engine;
pub mod ledger;
pub mod planner;
pub mod traits;

pub use aggregator::{check_conservation, Aggregation, BalanceAggregator};
pub use engine::{
    EngineConfig, GroupOutcome, InconsistencyPolicy, ReportStatus, SettlementEngine, SettlementReport,
};
pub use ledger::InMemoryLedger;
pub use planner::SettlementPlanner;
pub use r#async::{AsyncLedger, GroupProcessor};
pub use traits::{ObligationStore, WriteBack};
