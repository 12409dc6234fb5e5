//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `money`: Fixed-point integer-cents amounts
//! - `obligation`: Obligations, participants and identifiers
//! - `balance`: Derived net balances
//! - `settlement`: Settlement instructions and plans
//! - `error`: Error types for the settlement engine

pub mod balance;
pub mod error;
pub mod money;
pub mod obligation;
pub mod settlement;

pub use balance::{balance_totals, Balance};
pub use error::{InvalidReason, SettlementError};
pub use money::Cents;
pub use obligation::{
    GroupId, Obligation, ObligationId, ObligationStatus, Participant, ParticipantId,
    ParticipantPair,
};
pub use settlement::{Plan, PlanCondition, Settlement};
