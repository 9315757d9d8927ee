//! Branch operations: resolve, create, delete, list
//!
//! Engine-level module providing ref handling on top of the branch store and
//! the commit arena.
//!
//! ## Operations
//!
//! - `resolve`: Turn a ref (branch, commit id, or `branch@commit`) into a commit
//! - `create_branch`: Point a new branch at whatever a ref resolves to
//! - `delete_branch` / `delete_branch_if`: Remove a branch pointer
//! - `list_branches` / `branch`: Inspect branch heads
//!
//! Creating or deleting a branch never creates, changes or removes commits.

use crate::catalog::Catalog;
use branchlog_core::{BranchName, CatalogError, CatalogResult, CommitId};
use branchlog_storage::Branch;
use tracing::info;

impl Catalog {
    /// Resolve a ref to a commit id
    ///
    /// Branch names win over commit ids when a string is both.
    ///
    /// # Errors
    ///
    /// `RefNotFound` if the ref names no branch and no known commit, or if a
    /// `branch@commit` commit is not on that branch.
    pub fn resolve(&self, reference: &str) -> CatalogResult<CommitId> {
        if let Ok(name) = BranchName::new(reference) {
            if let Some(head) = self.branches.head(&name) {
                return Ok(head);
            }
        }
        if let Some(id) = CommitId::parse(reference) {
            if self.commits.contains(&id) {
                return Ok(id);
            }
        }
        if let Some((branch, hash)) = reference.split_once('@') {
            let head = BranchName::new(branch)
                .ok()
                .and_then(|name| self.branches.head(&name));
            let id = CommitId::parse(hash);
            if let (Some(head), Some(id)) = (head, id) {
                if self.commits.is_ancestor(id, head) {
                    return Ok(id);
                }
            }
        }
        Err(CatalogError::ref_not_found(reference))
    }

    /// Create branch `name` at the commit `source` resolves to
    ///
    /// # Errors
    ///
    /// - `InvalidBranchName` if `name` is not a valid branch name
    /// - `RefNotFound` if `source` does not resolve
    /// - `BranchExists` if `name` is taken
    pub fn create_branch(&self, name: &str, source: &str) -> CatalogResult<Branch> {
        let name = BranchName::new(name)?;
        let head = self.resolve(source)?;
        let branch = self.branches.create(name, head)?;
        info!(
            target: "branchlog::catalog",
            branch = %branch.name,
            source = source,
            head = %head.short(),
            "Branch created"
        );
        Ok(branch)
    }

    /// Delete branch `name`, returning the head it pointed at
    ///
    /// Writers still committing to the branch fail with `RefNotFound`.
    pub fn delete_branch(&self, name: &str) -> CatalogResult<CommitId> {
        self.delete(name, None)
    }

    /// Delete branch `name` only if its head is still `expected`
    ///
    /// # Errors
    ///
    /// `ConcurrentModification` if the head moved.
    pub fn delete_branch_if(&self, name: &str, expected: CommitId) -> CatalogResult<CommitId> {
        self.delete(name, Some(expected))
    }

    fn delete(&self, name: &str, expected: Option<CommitId>) -> CatalogResult<CommitId> {
        let name = BranchName::new(name)?;
        let head = self.branches.delete(&name, expected)?;
        info!(target: "branchlog::catalog", branch = %name, head = %head.short(), "Branch deleted");
        Ok(head)
    }

    /// All branches and their heads, sorted by name
    pub fn list_branches(&self) -> Vec<Branch> {
        self.branches.list()
    }

    /// Current state of branch `name`, if it exists
    pub fn branch(&self, name: &str) -> Option<Branch> {
        let name = BranchName::new(name).ok()?;
        self.branches.get(&name)
    }
}
