//! Catalog configuration via `catalog.toml`
//!
//! Every setting has a default, so an empty file (or no file) is a valid
//! configuration. Values are validated when loaded, not when first used.

use crate::retry::RetryConfig;
use branchlog_core::{BranchName, CatalogError, CatalogResult, CheckpointRetention, DEFAULT_BRANCH};
use branchlog_storage::DEFAULT_LEDGER_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name conventionally used for a catalog
pub const CONFIG_FILE_NAME: &str = "catalog.toml";

/// Catalog configuration loaded from `catalog.toml`.
///
/// # Example
///
/// ```toml
/// default_branch = "main"
/// ledger_cache_entries = 100000
///
/// [retry]
/// max_retries = 8
///
/// [checkpoints]
/// max_retained = 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Branch created when the catalog is opened
    #[serde(default = "default_branch_str")]
    pub default_branch: String,
    /// Upper bound on cached `(commit, key)` resolutions
    #[serde(default = "default_ledger_cache_entries")]
    pub ledger_cache_entries: usize,
    /// Commit retry policy
    #[serde(default)]
    pub retry: RetryConfig,
    /// Checkpoint history retention per table
    #[serde(default)]
    pub checkpoints: CheckpointRetention,
}

fn default_branch_str() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_ledger_cache_entries() -> usize {
    DEFAULT_LEDGER_CAPACITY
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch_str(),
            ledger_cache_entries: default_ledger_cache_entries(),
            retry: RetryConfig::default(),
            checkpoints: CheckpointRetention::default(),
        }
    }
}

impl CatalogConfig {
    /// Parse `default_branch` into a validated name.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the name is not a valid branch name.
    pub fn default_branch_name(&self) -> CatalogResult<BranchName> {
        BranchName::new(self.default_branch.as_str()).map_err(|e| {
            CatalogError::config(format!(
                "Invalid default_branch '{}' in {}: {}",
                self.default_branch, CONFIG_FILE_NAME, e
            ))
        })
    }

    /// Check every setting.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error naming the first invalid setting.
    pub fn validate(&self) -> CatalogResult<()> {
        self.default_branch_name()?;
        if self.checkpoints.max_retained == Some(0) {
            return Err(CatalogError::config(
                "checkpoints.max_retained must be at least 1",
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(CatalogError::config(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Branchlog catalog configuration
#
# Branch created when the catalog is opened.
default_branch = "main"

# Upper bound on cached (commit, key) resolutions. Reads stay correct when
# the cache is full; they just walk more history.
ledger_cache_entries = 100000

# Retry policy for commits that lose a race on the branch head.
[retry]
max_retries = 8
base_delay_ms = 1
max_delay_ms = 100

# Checkpoint history retention per table. Omit max_retained to keep every
# checkpoint; the newest checkpoint is always kept.
[checkpoints]
# max_retained = 10
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: CatalogConfig = toml::from_str(&content).map_err(|e| {
            CatalogError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> CatalogResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                CatalogError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> CatalogResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CatalogError::serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            CatalogError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
