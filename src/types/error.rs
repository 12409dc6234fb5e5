//! Error types for the settlement engine
//!
//! This module defines all error types that can occur while loading
//! obligations, aggregating balances and planning settlements.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: File not found, permission denied, etc.
//! - **CSV Parsing Errors**: Malformed CSV, invalid data types, etc.
//! - **Invalid Obligations**: Skipped with a warning, never abort a group
//! - **Structural Errors**: Conservation failures and degenerate plans,
//!   surfaced to the caller as typed results

use super::money::Cents;
use super::obligation::{GroupId, ObligationId};
use std::fmt;
use thiserror::Error;

/// Why an obligation was excluded from aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// Debtor and creditor are the same participant
    SelfObligation,

    /// Amount is zero or negative after truncation to cents
    NonPositiveAmount(Cents),

    /// Amount could not be read as a decimal number
    UnparseableAmount(String),

    /// Status is neither `pending` nor `settled`
    UnknownStatus(String),

    /// Another obligation with the same id was already seen
    DuplicateId,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::SelfObligation => f.write_str("debtor and creditor are the same"),
            InvalidReason::NonPositiveAmount(amount) => {
                write!(f, "amount {} is not positive", amount)
            }
            InvalidReason::UnparseableAmount(raw) => write!(f, "amount '{}' is not a number", raw),
            InvalidReason::UnknownStatus(raw) => write!(f, "unknown status '{}'", raw),
            InvalidReason::DuplicateId => f.write_str("duplicate obligation id"),
        }
    }
}

/// Main error type for the settlement engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettlementError {
    /// File not found at the specified path
    ///
    /// Fatal: processing cannot start.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// Recoverable: the malformed row is skipped.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// An obligation that cannot take part in aggregation
    ///
    /// Recoverable: the obligation is skipped and reported as a warning.
    #[error("Invalid obligation {id}: {reason}")]
    InvalidObligation {
        /// Obligation id
        id: ObligationId,
        /// What is wrong with it
        reason: InvalidReason,
    },

    /// Net balances do not sum to zero
    ///
    /// The aggregation fails closed: no balances and no plan are emitted.
    #[error("Aggregation inconsistency: credits {credits} do not match debits {debits}")]
    AggregationInconsistency {
        /// Sum of positive net balances
        credits: Cents,
        /// Sum of absolute negative net balances
        debits: Cents,
    },

    /// A running balance left the representable range
    ///
    /// Treated like an inconsistency: the aggregation fails closed.
    #[error("Arithmetic overflow in {operation} for participant {participant}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Participant whose balance overflowed
        participant: String,
    },

    /// The planner stopped with money left but no valid pair to move it
    #[error("Planning degenerate after {emitted} settlements: {residual} left unsettled")]
    PlanningDegenerate {
        /// Settlements emitted before the planner stopped
        emitted: usize,
        /// Magnitude left on the debtor side
        residual: Cents,
    },

    /// No obligations are recorded for the group
    #[error("Unknown group '{group}'")]
    UnknownGroup {
        /// The group that was asked for
        group: GroupId,
    },
}

// Conversion from io::Error to SettlementError
impl From<std::io::Error> for SettlementError {
    fn from(error: std::io::Error) -> Self {
        SettlementError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to SettlementError
impl From<csv::Error> for SettlementError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        SettlementError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl SettlementError {
    /// Create an InvalidObligation error
    pub fn invalid_obligation(id: ObligationId, reason: InvalidReason) -> Self {
        SettlementError::InvalidObligation { id, reason }
    }

    /// Create an AggregationInconsistency error
    pub fn aggregation_inconsistency(credits: Cents, debits: Cents) -> Self {
        SettlementError::AggregationInconsistency { credits, debits }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, participant: &str) -> Self {
        SettlementError::ArithmeticOverflow {
            operation: operation.to_string(),
            participant: participant.to_string(),
        }
    }

    /// Create a PlanningDegenerate error
    pub fn planning_degenerate(emitted: usize, residual: Cents) -> Self {
        SettlementError::PlanningDegenerate { emitted, residual }
    }

    /// Create an UnknownGroup error
    pub fn unknown_group(group: &str) -> Self {
        SettlementError::UnknownGroup {
            group: group.to_string(),
        }
    }

    /// Whether this error means the group's balances cannot be trusted
    ///
    /// These are the errors an [`InconsistencyPolicy`](crate::core::InconsistencyPolicy)
    /// decides about.
    pub fn is_inconsistency(&self) -> bool {
        matches!(
            self,
            SettlementError::AggregationInconsistency { .. }
                | SettlementError::ArithmeticOverflow { .. }
        )
    }
}
