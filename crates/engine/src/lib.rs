//! Catalog engine for branchlog
//!
//! This crate orchestrates the storage layer:
//! - Catalog: Main facade, opened from a `CatalogConfig`
//! - Branch operations: resolve refs, create, delete and list branches
//! - Commit engine: optimistic commits with bounded, backed-off retries
//!
//! The engine is the only component that knows about:
//! - Ref syntax (`branch`, `<commit id>`, `branch@<commit id>`)
//! - Turning external table-log writes into commits
//! - Configuration and retry policy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod branch_ops;
pub mod catalog;
pub mod commit_engine;
pub mod config;
pub mod retry;

pub use catalog::{Catalog, CommitInfo};
pub use commit_engine::{CommitEngine, CommitMetrics};
pub use config::{CatalogConfig, CONFIG_FILE_NAME};
pub use retry::RetryConfig;
