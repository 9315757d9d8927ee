//! Branch store: named, movable pointers into the commit graph
//!
//! Each branch head sits behind its own `parking_lot::Mutex`; the map of
//! branches is a DashMap. Advancing a branch is a compare-and-swap under that
//! branch's mutex only, so writers on different branches never wait on each
//! other and readers hold a lock just long enough to copy the head.
//!
//! ## Lock order
//!
//! The branch mutex may be taken while no DashMap guard is held, or a DashMap
//! guard may be taken while holding the branch mutex (delete). Never the
//! reverse: `Arc`s are cloned out of the map before locking.

use branchlog_core::{BranchName, CatalogError, CatalogResult, CommitId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Point-in-time view of a branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name
    pub name: BranchName,
    /// Commit the branch pointed at when read
    pub head: CommitId,
}

#[derive(Debug)]
struct BranchHead {
    head: CommitId,
    deleted: bool,
}

type Slot = Arc<Mutex<BranchHead>>;

/// All branches of a catalog
#[derive(Default)]
pub struct BranchStore {
    branches: DashMap<BranchName, Slot>,
}

impl BranchStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            branches: DashMap::new(),
        }
    }

    fn slot(&self, name: &BranchName) -> CatalogResult<Slot> {
        self.branches
            .get(name)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| CatalogError::ref_not_found(name.as_str()))
    }

    /// Create a branch pointing at `head`
    ///
    /// No commit is created; the new branch shares all history with whatever
    /// else points at `head`.
    ///
    /// A slot already marked deleted does not count as taken.
    ///
    /// # Errors
    ///
    /// `BranchExists` if the name is taken.
    pub fn create(&self, name: BranchName, head: CommitId) -> CatalogResult<Branch> {
        loop {
            let existing = match self.branches.entry(name.clone()) {
                Entry::Occupied(entry) => Arc::clone(entry.get()),
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Mutex::new(BranchHead {
                        head,
                        deleted: false,
                    })));
                    debug!(target: "branchlog::refs", branch = %name, head = %head.short(), "Branch created");
                    return Ok(Branch { name, head });
                }
            };

            // Map guard is released above; lock the slot only now
            let guard = existing.lock();
            if !guard.deleted {
                return Err(CatalogError::BranchExists(name.into_inner()));
            }
            self.branches
                .remove_if(&name, |_, s| Arc::ptr_eq(s, &existing));
        }
    }

    /// Current head of a branch
    pub fn head(&self, name: &BranchName) -> Option<CommitId> {
        let slot = self.slot(name).ok()?;
        let guard = slot.lock();
        (!guard.deleted).then_some(guard.head)
    }

    /// Snapshot of one branch
    pub fn get(&self, name: &BranchName) -> Option<Branch> {
        self.head(name).map(|head| Branch {
            name: name.clone(),
            head,
        })
    }

    /// Whether a branch exists
    pub fn contains(&self, name: &BranchName) -> bool {
        self.head(name).is_some()
    }

    /// Move a branch from `expected` to `new_head`
    ///
    /// # Errors
    ///
    /// - `RefNotFound` if the branch does not exist or was deleted
    /// - `ConcurrentModification` if the head is no longer `expected`
    pub fn advance(&self, name: &BranchName, expected: CommitId, new_head: CommitId) -> CatalogResult<()> {
        let slot = self.slot(name)?;
        let mut guard = slot.lock();
        if guard.deleted {
            return Err(CatalogError::ref_not_found(name.as_str()));
        }
        if guard.head != expected {
            return Err(CatalogError::ConcurrentModification {
                branch: name.to_string(),
                expected,
                actual: guard.head,
            });
        }
        guard.head = new_head;
        Ok(())
    }

    /// Remove a branch, optionally only if it still points at `expected`
    ///
    /// Commits the branch referenced are untouched. Returns the head the
    /// branch had when it was removed.
    ///
    /// # Errors
    ///
    /// - `RefNotFound` if the branch does not exist
    /// - `ConcurrentModification` if `expected` is given and does not match
    pub fn delete(&self, name: &BranchName, expected: Option<CommitId>) -> CatalogResult<CommitId> {
        let slot = self.slot(name)?;
        let mut guard = slot.lock();
        if guard.deleted {
            return Err(CatalogError::ref_not_found(name.as_str()));
        }
        if let Some(expected) = expected {
            if guard.head != expected {
                return Err(CatalogError::ConcurrentModification {
                    branch: name.to_string(),
                    expected,
                    actual: guard.head,
                });
            }
        }
        guard.deleted = true;
        self.branches.remove_if(name, |_, s| Arc::ptr_eq(s, &slot));
        debug!(target: "branchlog::refs", branch = %name, head = %guard.head.short(), "Branch deleted");
        Ok(guard.head)
    }

    /// All branches, sorted by name
    pub fn list(&self) -> Vec<Branch> {
        let slots: Vec<(BranchName, Slot)> = self
            .branches
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        let mut branches: Vec<Branch> = slots
            .into_iter()
            .filter_map(|(name, slot)| {
                let guard = slot.lock();
                (!guard.deleted).then(|| Branch {
                    name,
                    head: guard.head,
                })
            })
            .collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        branches
    }

    /// Number of branches
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Whether there are no branches
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}
