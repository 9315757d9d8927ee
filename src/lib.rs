//! Branchlog - branch-aware catalog for table-log histories
//!
//! Branchlog tracks, per branch and per table, where an external table log
//! wrote each metadata file and each checkpoint. Branches are isolated views:
//! two branches forked from one commit never see each other's appends.
//!
//! # Quick Start
//!
//! ```ignore
//! use branchlog::{Catalog, LogWrite};
//!
//! let catalog = Catalog::with_defaults()?;
//! catalog.record_write("main", "/lake/orders", &LogWrite::new(0, "00000.json"))?;
//! catalog.create_branch("test", "main")?;
//! catalog.record_write("test", "/lake/orders", &LogWrite::new(1, "00001.json"))?;
//!
//! let main = catalog.resolve_content("main", "/lake/orders")?;
//! ```
//!
//! # Architecture
//!
//! - `branchlog-core`: keys and the path codec, branch names, table content, errors
//! - `branchlog-storage`: commit arena, branch store, ledger index
//! - `branchlog-engine`: commit engine, catalog facade, configuration
//!
//! Only the catalog facade and the types it traffics in are re-exported here.

pub use branchlog_core::key::{decode, encode, table_root};
pub use branchlog_core::{
    BranchName, CatalogError, CatalogResult, CheckpointRetention, CommitId, CommitMeta,
    ContentId, ContentKey, LogEntry, LogWrite, TableContent, DEFAULT_BRANCH,
};
pub use branchlog_engine::{
    Catalog, CatalogConfig, CommitInfo, CommitMetrics, RetryConfig, CONFIG_FILE_NAME,
};
pub use branchlog_storage::{Branch, LedgerStats};
