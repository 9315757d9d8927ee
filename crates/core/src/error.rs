//! Error types for the branchlog catalog
//!
//! This module defines all error types used throughout the catalog.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Propagation
//!
//! | Error | Cause | Retried internally |
//! |-------|-------|--------------------|
//! | `InvalidPath` | malformed table path | no |
//! | `InvalidBranchName` | malformed branch name | no |
//! | `RefNotFound` | unknown branch or commit | no |
//! | `BranchExists` | create collision | no |
//! | `ConcurrentModification` | lost a branch compare-and-swap | yes |
//! | `CommitConflict` | retry budget exhausted | no |
//! | `InvalidContent` | append rejected by the ledger | no |

use crate::branch_name::BranchNameError;
use crate::key::PathError;
use crate::types::CommitId;
use thiserror::Error;

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Error types for the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A physical table path could not be turned into a content key
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The rejected input
        path: String,
        /// Why it was rejected
        reason: PathError,
    },

    /// A branch name failed validation
    #[error("Invalid branch name: {0}")]
    InvalidBranchName(#[from] BranchNameError),

    /// A branch name or commit id did not resolve
    #[error("Reference not found: {0}")]
    RefNotFound(String),

    /// A branch with this name already exists
    #[error("Branch already exists: {0}")]
    BranchExists(String),

    /// The branch head moved between read and compare-and-swap
    #[error("Concurrent modification of branch '{branch}': expected {expected}, found {actual}")]
    ConcurrentModification {
        /// Branch being advanced
        branch: String,
        /// Head the caller observed
        expected: CommitId,
        /// Head actually found
        actual: CommitId,
    },

    /// Every retry attempt lost the compare-and-swap
    #[error("Commit conflict on branch '{branch}' after {attempts} attempts")]
    CommitConflict {
        /// Branch being committed to
        branch: String,
        /// Number of attempts made
        attempts: usize,
    },

    /// The content mutation was rejected
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// Configuration could not be read, parsed or validated
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CatalogError {
    /// Build an `InvalidPath` error
    pub fn invalid_path(path: impl Into<String>, reason: PathError) -> Self {
        CatalogError::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// Build a `RefNotFound` error
    pub fn ref_not_found(reference: impl Into<String>) -> Self {
        CatalogError::RefNotFound(reference.into())
    }

    /// Build an `InvalidContent` error
    pub fn invalid_content(msg: impl Into<String>) -> Self {
        CatalogError::InvalidContent(msg.into())
    }

    /// Build a `Config` error
    pub fn config(msg: impl Into<String>) -> Self {
        CatalogError::Config(msg.into())
    }

    /// Build a `Serialization` error
    pub fn serialization(msg: impl Into<String>) -> Self {
        CatalogError::Serialization(msg.into())
    }

    /// True for a lost compare-and-swap on a branch head
    pub fn is_conflict(&self) -> bool {
        matches!(self, CatalogError::ConcurrentModification { .. })
    }

    /// True if the caller may reasonably retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::ConcurrentModification { .. } | CatalogError::CommitConflict { .. }
        )
    }

    /// True for errors caused by a name or commit that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::RefNotFound(_))
    }
}
