//! Core identity types for the catalog
//!
//! This module defines the foundational types:
//! - CommitId: Content hash addressing one commit in the commit graph
//! - ContentId: Stable identity of a table across all its revisions
//! - CommitMeta: Message, author and time attached to a commit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of a commit hash in bytes (SHA-256)
pub const COMMIT_ID_LEN: usize = 32;

/// Opaque commit identifier
///
/// A 32-byte hash rendered as 64 lowercase hex characters. The value carries
/// no ordering meaning; lineage is recorded by parent links in the commit
/// arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId([u8; COMMIT_ID_LEN]);

impl CommitId {
    /// Wrap raw hash bytes
    pub const fn from_bytes(bytes: [u8; COMMIT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8; COMMIT_ID_LEN] {
        &self.0
    }

    /// Parse a 64-character hex string
    ///
    /// Returns `None` for anything else, which lets callers fall through to
    /// other interpretations of a reference string.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != COMMIT_ID_LEN * 2 || !s.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; COMMIT_ID_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }

    /// First 8 hex characters, for log lines
    pub fn short(&self) -> String {
        self.to_string()[..8].to_string()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({})", self.short())
    }
}

impl FromStr for CommitId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommitId::parse(s).ok_or_else(|| format!("not a commit id: '{}'", s))
    }
}

impl Serialize for CommitId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CommitId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Stable identity of a table
///
/// Assigned when a table is first written and carried unchanged by every
/// later revision on every branch, so two branches holding diverged histories
/// of the same table still agree on its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId(Uuid);

impl ContentId {
    /// Create a new random ContentId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a ContentId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Get the raw bytes of this ContentId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for ContentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descriptive metadata recorded with every commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMeta {
    /// Free-form commit message
    pub message: String,
    /// Who made the change, if known
    pub author: Option<String>,
    /// When the commit was created
    pub committed_at: DateTime<Utc>,
}

impl CommitMeta {
    /// Metadata with the given message, no author, stamped now
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            author: None,
            committed_at: Utc::now(),
        }
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}
