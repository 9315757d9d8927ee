//! Commit engine: optimistic, retrying commits onto a branch
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. head = branch head                     (momentary lock)
//! 2. current = content of key at head       (ledger index)
//! 3. next = mutator(current or empty)
//! 4. IF next == current: return head         (nothing to record)
//! 5. commit = new Commit { parent: head, delta: key -> next }
//! 6. advance(branch, head, commit)          (compare-and-swap)
//! 7. IF lost the swap: discard commit, back off, goto 1
//! 8. record (commit, key) -> next in the ledger index
//! ```
//!
//! A failed commit leaves the branch exactly where it was. The only residue
//! of a lost attempt is an unreferenced commit, which is discarded at once.

use crate::retry::RetryConfig;
use branchlog_core::{
    BranchName, CatalogError, CatalogResult, CheckpointRetention, CommitMeta, ContentKey, LogWrite,
    TableContent,
};
use branchlog_storage::{BranchStore, Commit, CommitStore, Delta, LedgerIndex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Snapshot of commit engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommitMetrics {
    /// Commits that advanced a branch
    pub total_committed: u64,
    /// Commits skipped because the content did not change
    pub total_unchanged: u64,
    /// Attempts that lost the compare-and-swap and were retried
    pub total_retries: u64,
    /// Commits that ran out of retries
    pub total_conflicts: u64,
}

/// Applies content mutations as commits on branches
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering: they are observational only and
/// do not synchronize any other memory.
pub struct CommitEngine {
    commits: Arc<CommitStore>,
    branches: Arc<BranchStore>,
    ledger: Arc<LedgerIndex>,
    retry: RetryConfig,
    total_committed: AtomicU64,
    total_unchanged: AtomicU64,
    total_retries: AtomicU64,
    total_conflicts: AtomicU64,
}

impl CommitEngine {
    /// Create an engine over shared stores
    pub fn new(
        commits: Arc<CommitStore>,
        branches: Arc<BranchStore>,
        ledger: Arc<LedgerIndex>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            commits,
            branches,
            ledger,
            retry,
            total_committed: AtomicU64::new(0),
            total_unchanged: AtomicU64::new(0),
            total_retries: AtomicU64::new(0),
            total_conflicts: AtomicU64::new(0),
        }
    }

    /// Retry policy in effect
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Commit the result of `mutator` for `key` onto `branch`
    ///
    /// The mutator sees the key's content at the branch head (empty with a
    /// fresh content id if the key is absent) and returns the replacement.
    /// It may run once per attempt, so it must be a pure function of its
    /// input.
    ///
    /// Returns the new head commit, or the unchanged head if the mutator
    /// returned the content it was given.
    ///
    /// # Errors
    ///
    /// - `RefNotFound` if the branch does not exist (or is deleted mid-way)
    /// - `InvalidContent` if the mutator rejects the change or breaks the
    ///   ledger invariants
    /// - `CommitConflict` if every attempt lost the race for the branch head
    pub fn commit<F>(
        &self,
        branch: &BranchName,
        key: &ContentKey,
        meta: CommitMeta,
        mutator: F,
    ) -> CatalogResult<Arc<Commit>>
    where
        F: Fn(&TableContent) -> CatalogResult<TableContent>,
    {
        let attempts = self.retry.max_attempts();
        for attempt in 0..attempts {
            match self.try_commit(branch, key, &meta, &mutator) {
                Err(e) if e.is_conflict() => {
                    debug!(
                        target: "branchlog::commit",
                        branch = %branch,
                        key = %key,
                        attempt = attempt + 1,
                        error = %e,
                        "Lost branch head race"
                    );
                    if attempt + 1 < attempts {
                        self.total_retries.fetch_add(1, Ordering::Relaxed);
                        std::thread::sleep(self.retry.backoff_delay(attempt));
                    }
                }
                outcome => return outcome,
            }
        }

        self.total_conflicts.fetch_add(1, Ordering::Relaxed);
        warn!(
            target: "branchlog::commit",
            branch = %branch,
            key = %key,
            attempts,
            "Commit abandoned after conflicts"
        );
        Err(CatalogError::CommitConflict {
            branch: branch.to_string(),
            attempts,
        })
    }

    /// Record one table-log write for `key` onto `branch`
    pub fn record_write(
        &self,
        branch: &BranchName,
        key: &ContentKey,
        write: &LogWrite,
        retention: CheckpointRetention,
    ) -> CatalogResult<Arc<Commit>> {
        let message = match &write.checkpoint_location {
            Some(_) => format!("{}: log version {} (checkpoint)", key, write.version),
            None => format!("{}: log version {}", key, write.version),
        };
        self.commit(branch, key, CommitMeta::new(message), |current| {
            current.apply(write, retention)
        })
    }

    fn try_commit<F>(
        &self,
        branch: &BranchName,
        key: &ContentKey,
        meta: &CommitMeta,
        mutator: &F,
    ) -> CatalogResult<Arc<Commit>>
    where
        F: Fn(&TableContent) -> CatalogResult<TableContent>,
    {
        let head = self
            .branches
            .head(branch)
            .ok_or_else(|| CatalogError::ref_not_found(branch.as_str()))?;
        let current = self.ledger.resolve(&self.commits, head, key);
        let base = current
            .as_deref()
            .cloned()
            .unwrap_or_else(TableContent::empty);

        let next = mutator(&base)?;
        let unchanged = match &current {
            Some(existing) => **existing == next,
            None => next.is_empty(),
        };
        if unchanged {
            self.total_unchanged.fetch_add(1, Ordering::Relaxed);
            debug!(target: "branchlog::commit", branch = %branch, key = %key, "Content unchanged, nothing to commit");
            return self
                .commits
                .get(&head)
                .ok_or_else(|| CatalogError::ref_not_found(head.to_string()));
        }
        check_transition(&base, &next)?;

        let next = Arc::new(next);
        let mut delta = Delta::default();
        delta.insert(key.clone(), Arc::clone(&next));
        let commit = self.commits.create(head, meta.clone(), delta)?;

        if let Err(e) = self.branches.advance(branch, head, commit.id()) {
            self.commits.discard(&commit.id());
            return Err(e);
        }

        self.ledger.record(commit.id(), key.clone(), Some(next));
        self.total_committed.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "branchlog::commit",
            branch = %branch,
            key = %key,
            commit = %commit.id().short(),
            parent = %head.short(),
            "Commit applied"
        );
        Ok(commit)
    }

    /// Get commit metrics
    pub fn metrics(&self) -> CommitMetrics {
        CommitMetrics {
            total_committed: self.total_committed.load(Ordering::Relaxed),
            total_unchanged: self.total_unchanged.load(Ordering::Relaxed),
            total_retries: self.total_retries.load(Ordering::Relaxed),
            total_conflicts: self.total_conflicts.load(Ordering::Relaxed),
        }
    }
}

/// Reject mutator output that would rewrite history
fn check_transition(before: &TableContent, after: &TableContent) -> CatalogResult<()> {
    if after.id() != before.id() {
        return Err(CatalogError::invalid_content(format!(
            "content id changed from {} to {}",
            before.id(),
            after.id()
        )));
    }
    if !after.metadata_history().starts_with(before.metadata_history()) {
        return Err(CatalogError::invalid_content(
            "metadata history entries may only be appended",
        ));
    }
    after.check_invariants()
}
