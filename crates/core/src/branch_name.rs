//! Branch name type
//!
//! A branch is addressed by a user-facing name; the commit it points at is
//! tracked separately by the branch store. Names are validated once, at the
//! boundary, so every `BranchName` in the system is well-formed.
//!
//! ## Validation
//!
//! Branch names must:
//! - Be 1-256 bytes
//! - Contain only alphanumeric, dash, underscore, dot
//! - Start with an alphanumeric character or underscore

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length of a branch name in bytes
pub const MAX_BRANCH_NAME_LENGTH: usize = 256;

/// Name of the branch every catalog starts with unless configured otherwise
pub const DEFAULT_BRANCH: &str = "main";

/// Validated branch name
///
/// Valid names:
/// - "main"
/// - "etl.backfill-2024"
/// - "_scratch"
///
/// Invalid names:
/// - "" (empty)
/// - "-starts-with-dash"
/// - "has spaces"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

/// Error when validating a branch name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BranchNameError {
    /// Name is empty
    #[error("branch name cannot be empty")]
    Empty,

    /// Name exceeds maximum length
    #[error("branch name too long: {length} bytes (max {max})")]
    TooLong {
        /// Actual length of the name
        length: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Name contains invalid character
    #[error("invalid character '{char}' at position {position} (only alphanumeric, dash, underscore, dot allowed)")]
    InvalidChar {
        /// The invalid character
        char: char,
        /// Position of the invalid character
        position: usize,
    },

    /// Name starts with invalid character
    #[error("branch name cannot start with '{char}' (must start with alphanumeric or underscore)")]
    InvalidStart {
        /// The invalid starting character
        char: char,
    },
}

impl BranchName {
    /// Create a new BranchName, validating the input
    ///
    /// # Errors
    ///
    /// Returns `BranchNameError` if the name is invalid.
    pub fn new(name: impl Into<String>) -> Result<Self, BranchNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(BranchName(name))
    }

    /// The configured-by-default branch, `main`
    pub fn main() -> Self {
        BranchName(DEFAULT_BRANCH.to_string())
    }

    /// Validate a branch name
    pub fn validate(name: &str) -> Result<(), BranchNameError> {
        let first = name.chars().next().ok_or(BranchNameError::Empty)?;

        if name.len() > MAX_BRANCH_NAME_LENGTH {
            return Err(BranchNameError::TooLong {
                length: name.len(),
                max: MAX_BRANCH_NAME_LENGTH,
            });
        }

        if !first.is_ascii_alphanumeric() && first != '_' {
            return Err(BranchNameError::InvalidStart { char: first });
        }

        match name.chars().enumerate().find(|(_, c)| !is_valid_char(*c)) {
            Some((position, char)) => Err(BranchNameError::InvalidChar { char, position }),
            None => Ok(()),
        }
    }

    /// Get the name as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

#[inline]
fn is_valid_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = BranchNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BranchName::new(value)
    }
}

impl TryFrom<&str> for BranchName {
    type Error = BranchNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        BranchName::new(value)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}
