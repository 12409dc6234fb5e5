//! Concurrent implementations of the core components
//!
//! The settlement computation itself is pure and needs no synchronization.
//! What is shared between tasks is the obligation ledger, so this module
//! provides:
//!
//! - **AsyncLedger**: Thread-safe obligation store using DashMap
//! - **GroupProcessor**: Ingests obligations and settles groups concurrently
//!
//! # Thread Safety
//!
//! - Work on different groups proceeds in parallel
//! - Work on the same group is serialized by the group's map entry
//! - No global locks

pub mod group_processor;
pub mod ledger;

pub use group_processor::GroupProcessor;
pub use ledger::AsyncLedger;
