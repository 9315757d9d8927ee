//! Table-Log Branching Integration Tests
//!
//! Drives the catalog the way an external table-log writer would: one
//! `record_write` per log version, checkpoints every n-th version, several
//! branches reading and writing the same physical table.

#[path = "../common/mod.rs"]
mod common;

mod checkpoints;
mod concurrent_commits;
mod config_file;
mod scenarios;
