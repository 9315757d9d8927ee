//! Ledger index: cached `(commit, key) -> content` resolution
//!
//! Resolving a key at a commit means walking toward the root until some
//! commit's delta touched the key. The index remembers answers so repeated
//! reads (and reads just after a write) stop at the first cached commit
//! instead of walking the whole lineage.
//!
//! The index is only a cache. Every entry is derivable from the commit arena,
//! entries are never invalidated (commits are immutable), and dropping the
//! whole index changes latency, not results.
//!
//! # Maintenance
//!
//! - The commit engine records the written content for the new commit
//! - `resolve` records its answer for the commit it started from
//! - Once `capacity` entries exist, new answers are computed but not stored

use crate::commit::CommitStore;
use branchlog_core::{CommitId, ContentKey, TableContent};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default maximum number of cached entries
pub const DEFAULT_LEDGER_CAPACITY: usize = 100_000;

/// Cache hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Lookups answered from the cache at the starting commit
    pub hits: u64,
    /// Lookups that walked at least one commit
    pub misses: u64,
    /// Entries currently cached
    pub entries: usize,
}

/// Per-(commit, key) cache of resolved table content
pub struct LedgerIndex {
    entries: DashMap<(CommitId, ContentKey), Option<Arc<TableContent>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LedgerIndex {
    /// Create an index holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Remember that `key` resolves to `content` at `commit`
    pub fn record(&self, commit: CommitId, key: ContentKey, content: Option<Arc<TableContent>>) {
        if self.entries.len() < self.capacity {
            self.entries.insert((commit, key), content);
        }
    }

    fn cached(&self, commit: CommitId, key: &ContentKey) -> Option<Option<Arc<TableContent>>> {
        // The tuple key needs an owned ContentKey; clone is cheap next to a walk
        self.entries
            .get(&(commit, key.clone()))
            .map(|e| e.value().clone())
    }

    /// Content of `key` as of `commit`
    ///
    /// Walks from `commit` toward the root and returns the first delta entry
    /// for `key` (most recent wins), or `None` if no ancestor touched it.
    /// An unknown `commit` resolves to `None`; callers check existence first.
    pub fn resolve(
        &self,
        commits: &CommitStore,
        commit: CommitId,
        key: &ContentKey,
    ) -> Option<Arc<TableContent>> {
        if let Some(hit) = self.cached(commit, key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let mut found = None;
        for ancestor in commits.ancestors(commit) {
            if ancestor.id() != commit {
                if let Some(hit) = self.cached(ancestor.id(), key) {
                    found = hit;
                    break;
                }
            }
            if let Some(content) = ancestor.content_for(key) {
                found = Some(Arc::clone(content));
                break;
            }
        }

        self.record(commit, key.clone(), found.clone());
        found
    }

    /// Current counters
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for LedgerIndex {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_CAPACITY)
    }
}
