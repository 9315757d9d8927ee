//! Core types for branchlog
//!
//! This crate defines the foundational types used throughout the catalog:
//! - ContentKey: Canonical key for a table, plus the table-path codec
//! - BranchName: Validated branch name
//! - CommitId / ContentId / CommitMeta: Identity types
//! - TableContent: Per-table metadata and checkpoint history ledger
//! - CatalogError: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod branch_name;
pub mod content;
pub mod error;
pub mod key;
pub mod types;

pub use branch_name::{BranchName, BranchNameError, DEFAULT_BRANCH, MAX_BRANCH_NAME_LENGTH};
pub use content::{CheckpointRetention, LogEntry, LogWrite, TableContent};
pub use error::{CatalogError, CatalogResult};
pub use key::{ContentKey, PathError, TABLE_LOG_DIR};
pub use types::{CommitId, CommitMeta, ContentId, COMMIT_ID_LEN};
