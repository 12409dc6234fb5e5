//! Rust Settlement Engine Library
//! # Overview
//!
//! This library turns a group's pending debts into the payments that clear
//! them. Obligations ("A owes B amount") are reduced to one net balance per
//! participant, and a greedy planner pairs the largest debtor with the
//! largest creditor until every balance is zero.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Cents, Obligation, Balance, Settlement, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::aggregator`] - Obligations to net balances, with a conservation check
//!   - [`core::planner`] - Net balances to settlement instructions
//!   - [`core::engine`] - Per-group orchestration and inconsistency policy
//!   - [`core::ledger`] - In-memory obligation store with write-back
//! - [`io`] - CSV reading and writing
//! - [`strategy`] - Sync and async processing pipelines
//!
//! # Guarantees
//!
//! For every group:
//! - Net balances sum to zero, or the group is reported as inconsistent
//! - No settlement pays a participant to themself
//! - Applying the plan brings every balance to zero within one cent
//! - At most N - 1 settlements for N participants with non-zero balances
//! - The same snapshot always yields the same plan
//!
//! # Example
//!
//! ```
//! use rust_settlement_engine::core::SettlementEngine;
//! use rust_settlement_engine::types::{Cents, Obligation, ObligationStatus, Participant};
//!
//! let owes = |id, debtor: &str, creditor: &str| Obligation {
//!     id,
//!     group: "trip".to_string(),
//!     debtor: Participant::new(debtor, debtor),
//!     creditor: Participant::new(creditor, creditor),
//!     amount: Cents::new(3000),
//!     status: ObligationStatus::Pending,
//! };
//!
//! let report = SettlementEngine::default()
//!     .compute("trip", &[owes(1, "b", "c"), owes(2, "a", "b")])
//!     .unwrap();
//!
//! assert_eq!(report.settlements.len(), 1);
//! assert_eq!(report.settlements[0].to_string(), "a pays c 30.00");
//! ```

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    BalanceAggregator, EngineConfig, InMemoryLedger, InconsistencyPolicy, ObligationStore,
    SettlementEngine, SettlementPlanner,
};
pub use io::{write_ledger_csv, write_settlements_csv};
pub use types::{
    Balance, Cents, GroupId, Obligation, ObligationId, ObligationStatus, Participant,
    ParticipantId, Settlement, SettlementError,
};
