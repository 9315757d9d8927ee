//! Catalog struct and open logic
//!
//! This module provides the `Catalog` facade that ties together:
//! - The commit arena and branch store
//! - The ledger index used to answer reads
//! - The commit engine used for writes
//!
//! ## Refs
//!
//! Every read takes a ref and every write takes a branch, explicitly. There
//! is no process-wide current branch. A ref is one of:
//!
//! 1. A branch name (`main`) resolving to the branch's current head
//! 2. A full commit id (64 hex characters)
//! 3. `branch@commit`, a commit that must lie on the branch's history
//!
//! Branch management lives in [`crate::branch_ops`].

use crate::commit_engine::{CommitEngine, CommitMetrics};
use crate::config::CatalogConfig;
use branchlog_core::key::encode;
use branchlog_core::{
    BranchName, CatalogResult, CommitId, CommitMeta, ContentKey, LogWrite, TableContent,
};
use branchlog_storage::{BranchStore, Commit, CommitStore, LedgerIndex, LedgerStats};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Result types
// ============================================================================

/// One entry of a commit log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitInfo {
    /// Commit id
    pub id: CommitId,
    /// Parent commit, `None` for the root
    pub parent: Option<CommitId>,
    /// Distance from the root
    pub depth: u64,
    /// Message, author and timestamp
    pub meta: CommitMeta,
    /// Keys the commit changed, sorted
    pub keys: Vec<ContentKey>,
}

impl CommitInfo {
    fn from_commit(commit: &Commit) -> Self {
        Self {
            id: commit.id(),
            parent: commit.parent(),
            depth: commit.depth(),
            meta: commit.meta().clone(),
            keys: commit.touched_keys(),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A branch-aware catalog of table-log histories
///
/// Cheap to share behind an `Arc`; every method takes `&self` and is safe to
/// call from any number of threads.
pub struct Catalog {
    config: CatalogConfig,
    default_branch: BranchName,
    pub(crate) commits: Arc<CommitStore>,
    pub(crate) branches: Arc<BranchStore>,
    pub(crate) ledger: Arc<LedgerIndex>,
    engine: CommitEngine,
}

impl Catalog {
    /// Open a catalog with the given configuration
    ///
    /// The configured default branch is created pointing at the root commit.
    ///
    /// # Errors
    ///
    /// `Config` if the configuration is invalid.
    pub fn open(config: CatalogConfig) -> CatalogResult<Self> {
        config.validate()?;
        let default_branch = config.default_branch_name()?;

        let commits = Arc::new(CommitStore::new());
        let branches = Arc::new(BranchStore::new());
        let ledger = Arc::new(LedgerIndex::new(config.ledger_cache_entries));
        branches.create(default_branch.clone(), commits.root_id())?;

        let engine = CommitEngine::new(
            Arc::clone(&commits),
            Arc::clone(&branches),
            Arc::clone(&ledger),
            config.retry.clone(),
        );

        info!(
            target: "branchlog::catalog",
            default_branch = %default_branch,
            root = %commits.root_id().short(),
            "Catalog opened"
        );

        Ok(Self {
            config,
            default_branch,
            commits,
            branches,
            ledger,
            engine,
        })
    }

    /// Open a catalog with the default configuration
    pub fn with_defaults() -> CatalogResult<Self> {
        Self::open(CatalogConfig::default())
    }

    /// Open a catalog configured by a `catalog.toml` file
    pub fn from_config_file(path: &Path) -> CatalogResult<Self> {
        Self::open(CatalogConfig::from_file(path)?)
    }

    /// Configuration the catalog was opened with
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Branch created at open
    pub fn default_branch(&self) -> &BranchName {
        &self.default_branch
    }

    /// Root commit shared by every lineage
    pub fn root(&self) -> CommitId {
        self.commits.root_id()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Content of `key` as seen from `reference`
    ///
    /// # Errors
    ///
    /// `RefNotFound` if the ref does not resolve.
    pub fn get_content(
        &self,
        reference: &str,
        key: &ContentKey,
    ) -> CatalogResult<Option<Arc<TableContent>>> {
        let commit = self.resolve(reference)?;
        Ok(self.ledger.resolve(&self.commits, commit, key))
    }

    /// Content of several keys from one snapshot of `reference`
    ///
    /// Keys that were never written are left out of the result.
    pub fn get_contents(
        &self,
        reference: &str,
        keys: &[ContentKey],
    ) -> CatalogResult<BTreeMap<ContentKey, Arc<TableContent>>> {
        let commit = self.resolve(reference)?;
        Ok(keys
            .iter()
            .filter_map(|key| {
                self.ledger
                    .resolve(&self.commits, commit, key)
                    .map(|content| (key.clone(), content))
            })
            .collect())
    }

    /// Content of the table at `physical_path` as seen from `reference`
    ///
    /// # Errors
    ///
    /// `InvalidPath` if the path cannot be encoded, `RefNotFound` if the ref
    /// does not resolve.
    pub fn resolve_content(
        &self,
        reference: &str,
        physical_path: &str,
    ) -> CatalogResult<Option<Arc<TableContent>>> {
        let key = encode(physical_path)?;
        self.get_content(reference, &key)
    }

    /// Commits reachable from `reference`, newest first, at most `limit`
    pub fn commit_log(&self, reference: &str, limit: usize) -> CatalogResult<Vec<CommitInfo>> {
        let start = self.resolve(reference)?;
        Ok(self
            .commits
            .ancestors(start)
            .take(limit)
            .map(|c| CommitInfo::from_commit(&c))
            .collect())
    }

    /// Ledger index counters
    pub fn ledger_stats(&self) -> LedgerStats {
        self.ledger.stats()
    }

    /// Commit engine counters
    pub fn commit_metrics(&self) -> CommitMetrics {
        self.engine.metrics()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Commit the result of `mutator` for `key` onto `branch`
    ///
    /// See [`CommitEngine::commit`] for the retry behaviour. Returns the id of
    /// the branch head after the commit.
    pub fn commit<F>(
        &self,
        branch: &str,
        key: &ContentKey,
        meta: CommitMeta,
        mutator: F,
    ) -> CatalogResult<CommitId>
    where
        F: Fn(&TableContent) -> CatalogResult<TableContent>,
    {
        let branch = BranchName::new(branch)?;
        Ok(self.engine.commit(&branch, key, meta, mutator)?.id())
    }

    /// Record one write of the external table log onto `branch`
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if the path cannot be encoded
    /// - `InvalidContent` if the write does not follow the recorded history
    /// - `RefNotFound` if the branch does not exist
    /// - `CommitConflict` if the retry budget ran out
    pub fn record_write(
        &self,
        branch: &str,
        physical_path: &str,
        write: &LogWrite,
    ) -> CatalogResult<CommitId> {
        let branch = BranchName::new(branch)?;
        let key = encode(physical_path)?;
        let commit = self
            .engine
            .record_write(&branch, &key, write, self.config.checkpoints)?;
        Ok(commit.id())
    }
}
