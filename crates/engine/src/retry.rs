//! Backoff between commit attempts
//!
//! Losing the branch head swap means another writer advanced the branch
//! first. The commit engine rebuilds the commit on the new head and tries
//! again, sleeping a little longer after every lost swap.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How hard a writer fights for a contended branch head
///
/// Loaded from the `[retry]` table of `catalog.toml`; missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Lost swaps tolerated before giving up with `CommitConflict`
    pub max_retries: usize,
    /// Sleep after the first lost swap, doubled after each further one
    pub base_delay_ms: u64,
    /// Upper bound on a single sleep
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            base_delay_ms: 1,
            max_delay_ms: 100,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on the first lost swap
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Commit attempts a writer makes in total, the first one included
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Sleep before retrying after lost swap number `lost` (zero based)
    pub(crate) fn backoff_delay(&self, lost: usize) -> Duration {
        let exponent = u32::try_from(lost).unwrap_or(u32::MAX);
        let factor = 2u64.saturating_pow(exponent);
        let millis = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}
