//! Storage layer for branchlog
//!
//! This crate holds the in-memory state of a catalog:
//! - CommitStore: Arena of immutable commits addressed by id
//! - BranchStore: Named branch heads with per-branch compare-and-swap
//! - LedgerIndex: Cache of `(commit, key) -> content` resolutions
//!
//! # Concurrency
//!
//! - DashMap everywhere a map is shared, so lookups never take a global lock
//! - One `parking_lot::Mutex` per branch head; no lock spans two branches
//! - Commits are immutable once stored, so reads need no coordination

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commit;
pub mod ledger;
pub mod refs;

pub use commit::{Ancestors, Commit, CommitStore, Delta, NO_ANCESTOR};
pub use ledger::{LedgerIndex, LedgerStats, DEFAULT_LEDGER_CAPACITY};
pub use refs::{Branch, BranchStore};
