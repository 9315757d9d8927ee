//! Commit arena
//!
//! Commits are immutable records addressed by [`CommitId`]. Each one stores
//! its parent id and the delta of table contents it changed; there are no
//! live parent pointers, so the graph is walked by id lookups.
//!
//! # Design
//!
//! - DashMap: commit lookups never take a global lock
//! - `Arc<Commit>`: readers hold a commit without copying its delta
//! - Commit ids are SHA-256 over parent, depth, metadata, delta and a
//!   per-store sequence number, so every created commit gets a distinct id
//!
//! A commit becomes reachable only when a branch is advanced to it. Commits
//! that lose the branch compare-and-swap are removed with [`CommitStore::discard`].

use branchlog_core::{CatalogError, CatalogResult, CommitId, CommitMeta, ContentKey, TableContent};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Id of the root commit every catalog starts from
pub const NO_ANCESTOR: CommitId = CommitId::from_bytes([0u8; 32]);

/// Table contents changed by one commit
pub type Delta = FxHashMap<ContentKey, Arc<TableContent>>;

/// An immutable node in the commit graph
#[derive(Debug)]
pub struct Commit {
    id: CommitId,
    parent: Option<CommitId>,
    depth: u64,
    meta: CommitMeta,
    delta: Delta,
}

impl Commit {
    fn root() -> Self {
        Self {
            id: NO_ANCESTOR,
            parent: None,
            depth: 0,
            meta: CommitMeta {
                message: "root".to_string(),
                author: None,
                committed_at: DateTime::<Utc>::default(),
            },
            delta: Delta::default(),
        }
    }

    /// Commit id
    pub fn id(&self) -> CommitId {
        self.id
    }

    /// Parent id (`None` only for the root)
    pub fn parent(&self) -> Option<CommitId> {
        self.parent
    }

    /// Number of commits between this one and the root
    pub fn depth(&self) -> u64 {
        self.depth
    }

    /// Commit metadata
    pub fn meta(&self) -> &CommitMeta {
        &self.meta
    }

    /// Contents changed by this commit
    pub fn delta(&self) -> &Delta {
        &self.delta
    }

    /// Content this commit wrote for `key`, if it touched it
    pub fn content_for(&self, key: &ContentKey) -> Option<&Arc<TableContent>> {
        self.delta.get(key)
    }

    /// Keys touched by this commit, sorted
    pub fn touched_keys(&self) -> Vec<ContentKey> {
        let mut keys: Vec<ContentKey> = self.delta.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether this is the root commit
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

fn commit_hash(
    parent: &Commit,
    meta: &CommitMeta,
    delta: &Delta,
    sequence: u64,
) -> CatalogResult<CommitId> {
    let mut hasher = Sha256::new();
    hasher.update(parent.id.as_bytes());
    hasher.update((parent.depth + 1).to_le_bytes());
    hasher.update(sequence.to_le_bytes());
    let meta_bytes = serde_json::to_vec(meta).map_err(|e| CatalogError::serialization(e.to_string()))?;
    hasher.update(&meta_bytes);

    let mut entries: Vec<(&ContentKey, &Arc<TableContent>)> = delta.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (key, content) in entries {
        let bytes = serde_json::to_vec(&(key, content.as_ref()))
            .map_err(|e| CatalogError::serialization(e.to_string()))?;
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(CommitId::from_bytes(hasher.finalize().into()))
}

/// Arena of all commits known to the catalog
pub struct CommitStore {
    commits: DashMap<CommitId, Arc<Commit>>,
    sequence: AtomicU64,
}

impl CommitStore {
    /// Create a store holding only the root commit
    pub fn new() -> Self {
        let commits = DashMap::new();
        commits.insert(NO_ANCESTOR, Arc::new(Commit::root()));
        Self {
            commits,
            sequence: AtomicU64::new(0),
        }
    }

    /// Id of the root commit
    pub fn root_id(&self) -> CommitId {
        NO_ANCESTOR
    }

    /// Look up a commit
    pub fn get(&self, id: &CommitId) -> Option<Arc<Commit>> {
        self.commits.get(id).map(|c| Arc::clone(c.value()))
    }

    /// Whether a commit exists
    pub fn contains(&self, id: &CommitId) -> bool {
        self.commits.contains_key(id)
    }

    /// Number of commits, root included
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Always false: the root commit is never removed
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Create a child of `parent` carrying `delta`
    ///
    /// The commit is stored but not yet referenced by any branch.
    ///
    /// # Errors
    ///
    /// `RefNotFound` if `parent` is unknown.
    pub fn create(&self, parent: CommitId, meta: CommitMeta, delta: Delta) -> CatalogResult<Arc<Commit>> {
        let parent = self
            .get(&parent)
            .ok_or_else(|| CatalogError::ref_not_found(parent.to_string()))?;
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let id = commit_hash(&parent, &meta, &delta, sequence)?;
        let commit = Arc::new(Commit {
            id,
            parent: Some(parent.id),
            depth: parent.depth + 1,
            meta,
            delta,
        });
        self.commits.insert(id, Arc::clone(&commit));
        Ok(commit)
    }

    /// Drop a commit that never became reachable
    ///
    /// The root is never removed.
    pub fn discard(&self, id: &CommitId) {
        if *id != NO_ANCESTOR {
            self.commits.remove(id);
        }
    }

    /// Walk from `start` to the root, newest first
    ///
    /// Yields nothing if `start` is unknown.
    pub fn ancestors(&self, start: CommitId) -> Ancestors<'_> {
        Ancestors {
            store: self,
            next: Some(start),
        }
    }

    /// Whether `ancestor` is `descendant` or one of its ancestors
    pub fn is_ancestor(&self, ancestor: CommitId, descendant: CommitId) -> bool {
        let Some(target) = self.get(&ancestor) else {
            return false;
        };
        self.ancestors(descendant)
            .take_while(|c| c.depth >= target.depth)
            .any(|c| c.id == ancestor)
    }
}

impl Default for CommitStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a commit and its ancestors
pub struct Ancestors<'a> {
    store: &'a CommitStore,
    next: Option<CommitId>,
}

impl Iterator for Ancestors<'_> {
    type Item = Arc<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        let commit = self.store.get(&self.next?)?;
        self.next = commit.parent;
        Some(commit)
    }
}
