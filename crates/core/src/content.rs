//! Table content: the per-table history ledger
//!
//! `TableContent` is what the catalog stores for each key. It records where
//! the external table log put each metadata entry and each checkpoint, in log
//! order. The catalog never reads those files; it only keeps the locations
//! and their ordering consistent.
//!
//! ## Invariants
//!
//! | # | Invariant |
//! |---|-----------|
//! | 1 | Metadata versions are strictly increasing |
//! | 2 | Every checkpoint version is also a metadata version |
//! | 3 | Checkpoint history is never longer than metadata history |
//! | 4 | `last_checkpoint`, if set, is the newest checkpoint history entry |
//!
//! ## Transitions
//!
//! ```text
//! Absent            --append m0-->         Present([m0], [])
//! Present(mh, ch)   --append mi-->         Present(mh+[mi], ch)
//! Present(mh, ch)   --append mi + cj-->    Present(mh+[mi], ch+[cj]), last = cj
//! ```
//!
//! No transition removes metadata entries. Checkpoint history may be bounded
//! by [`CheckpointRetention`]; the newest checkpoint is always kept.

use crate::error::{CatalogError, CatalogResult};
use crate::types::ContentId;
use serde::{Deserialize, Serialize};

/// One file recorded in a history: the log version it belongs to and where
/// it lives
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntry {
    /// Table-log version the file belongs to
    pub version: u64,
    /// Location of the file as reported by the writer
    pub location: String,
}

impl LogEntry {
    /// Create an entry
    pub fn new(version: u64, location: impl Into<String>) -> Self {
        Self {
            version,
            location: location.into(),
        }
    }
}

/// One write reported by the external table-log writer
///
/// `checkpoint_location` is set when the writer also emitted a checkpoint for
/// this version. The catalog records that fact; it never decides when a
/// checkpoint happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogWrite {
    /// Table-log version produced by the write
    pub version: u64,
    /// Location of the new metadata (log entry) file
    pub metadata_location: String,
    /// Location of the checkpoint written alongside, if any
    pub checkpoint_location: Option<String>,
}

impl LogWrite {
    /// An ordinary append
    pub fn new(version: u64, metadata_location: impl Into<String>) -> Self {
        Self {
            version,
            metadata_location: metadata_location.into(),
            checkpoint_location: None,
        }
    }

    /// Mark this write as having produced a checkpoint
    pub fn with_checkpoint(mut self, checkpoint_location: impl Into<String>) -> Self {
        self.checkpoint_location = Some(checkpoint_location.into());
        self
    }

    /// Whether the write produced a checkpoint
    pub fn is_checkpoint(&self) -> bool {
        self.checkpoint_location.is_some()
    }
}

/// How much checkpoint history to keep per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckpointRetention {
    /// Keep at most this many of the newest checkpoints (`None` keeps all).
    /// Values below 1 are treated as 1 so `last_checkpoint` always survives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retained: Option<usize>,
}

impl CheckpointRetention {
    /// Keep every checkpoint
    pub fn unbounded() -> Self {
        Self { max_retained: None }
    }

    /// Keep only the newest `n` checkpoints
    pub fn newest(n: usize) -> Self {
        Self {
            max_retained: Some(n),
        }
    }
}

/// History of one table as seen from one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableContent {
    id: ContentId,
    metadata_history: Vec<LogEntry>,
    checkpoint_history: Vec<LogEntry>,
    last_checkpoint: Option<LogEntry>,
}

impl TableContent {
    /// A table with no history yet and a fresh content id
    pub fn empty() -> Self {
        Self::with_id(ContentId::new())
    }

    /// A table with no history yet and the given content id
    pub fn with_id(id: ContentId) -> Self {
        Self {
            id,
            metadata_history: Vec::new(),
            checkpoint_history: Vec::new(),
            last_checkpoint: None,
        }
    }

    /// Stable table identity
    pub fn id(&self) -> ContentId {
        self.id
    }

    /// Metadata files in log order
    pub fn metadata_history(&self) -> &[LogEntry] {
        &self.metadata_history
    }

    /// Checkpoint files in log order
    pub fn checkpoint_history(&self) -> &[LogEntry] {
        &self.checkpoint_history
    }

    /// Newest checkpoint
    pub fn last_checkpoint(&self) -> Option<&LogEntry> {
        self.last_checkpoint.as_ref()
    }

    /// Newest metadata entry
    pub fn latest_metadata(&self) -> Option<&LogEntry> {
        self.metadata_history.last()
    }

    /// Newest log version recorded
    pub fn latest_version(&self) -> Option<u64> {
        self.latest_metadata().map(|e| e.version)
    }

    /// True before the first append
    pub fn is_empty(&self) -> bool {
        self.metadata_history.is_empty()
    }

    /// Whether `write` is already the newest recorded entry
    ///
    /// A writer that retries after a lost response re-submits the same write;
    /// recording it twice would duplicate history.
    pub fn already_recorded(&self, write: &LogWrite) -> bool {
        let Some(last) = self.latest_metadata() else {
            return false;
        };
        if last.version != write.version || last.location != write.metadata_location {
            return false;
        }
        match &write.checkpoint_location {
            None => true,
            Some(location) => self
                .last_checkpoint
                .as_ref()
                .is_some_and(|c| c.version == write.version && &c.location == location),
        }
    }

    /// Produce the content that results from recording `write`
    ///
    /// Re-recording the newest entry returns an identical copy.
    ///
    /// # Errors
    ///
    /// `InvalidContent` if a location is empty or `write.version` does not
    /// move the log forward.
    pub fn apply(&self, write: &LogWrite, retention: CheckpointRetention) -> CatalogResult<Self> {
        if self.already_recorded(write) {
            return Ok(self.clone());
        }
        if write.metadata_location.is_empty() {
            return Err(CatalogError::invalid_content("metadata location is empty"));
        }
        if write.checkpoint_location.as_deref() == Some("") {
            return Err(CatalogError::invalid_content("checkpoint location is empty"));
        }
        if let Some(latest) = self.latest_version() {
            if write.version <= latest {
                return Err(CatalogError::invalid_content(format!(
                    "log version {} does not follow recorded version {}",
                    write.version, latest
                )));
            }
        }

        let mut next = self.clone();
        next.metadata_history
            .push(LogEntry::new(write.version, write.metadata_location.clone()));

        if let Some(location) = &write.checkpoint_location {
            let checkpoint = LogEntry::new(write.version, location.clone());
            next.checkpoint_history.push(checkpoint.clone());
            next.last_checkpoint = Some(checkpoint);

            if let Some(max) = retention.max_retained {
                let keep = max.max(1);
                let excess = next.checkpoint_history.len().saturating_sub(keep);
                next.checkpoint_history.drain(..excess);
            }
        }
        Ok(next)
    }

    /// Verify the ledger invariants
    pub fn check_invariants(&self) -> CatalogResult<()> {
        if self
            .metadata_history
            .windows(2)
            .any(|w| w[0].version >= w[1].version)
        {
            return Err(CatalogError::invalid_content(
                "metadata versions are not strictly increasing",
            ));
        }
        if self.checkpoint_history.len() > self.metadata_history.len() {
            return Err(CatalogError::invalid_content(
                "checkpoint history longer than metadata history",
            ));
        }
        for checkpoint in &self.checkpoint_history {
            if self
                .metadata_history
                .binary_search_by_key(&checkpoint.version, |e| e.version)
                .is_err()
            {
                return Err(CatalogError::invalid_content(format!(
                    "checkpoint at version {} has no metadata entry",
                    checkpoint.version
                )));
            }
        }
        if self.last_checkpoint.as_ref() != self.checkpoint_history.last() {
            return Err(CatalogError::invalid_content(
                "last checkpoint is not the newest checkpoint history entry",
            ));
        }
        Ok(())
    }
}
