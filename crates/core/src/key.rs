//! Content keys and the table-path codec
//!
//! A [`ContentKey`] is the catalog's name for one logical table. It is derived
//! from the table's physical location so that every writer and reader that
//! points at the same table-log directory lands on the same key.
//!
//! ## Canonical form
//!
//! - `file:` scheme is dropped, other schemes become the first element
//!   including their separator (`s3://`); a path segment never contains `/`,
//!   so a scheme element cannot collide with a local segment such as `C:`
//! - `\` is treated as `/`
//! - empty and `.` segments are dropped, `..` removes the previous segment
//! - the key always ends in the table-log directory `_delta_log`, so the table
//!   root and its log directory encode to the same key
//!
//! `decode(encode(p))` renders an absolute path (or `scheme://...` URI) that
//! addresses the same table-log directory as `p`, and encodes back to the
//! same key.

use crate::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Directory inside a table root that holds the numbered log entries
pub const TABLE_LOG_DIR: &str = "_delta_log";

/// Reasons a path or element list cannot become a content key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Input was empty or whitespace only
    #[error("path is empty")]
    Empty,

    /// Input contained only separators or `.` segments
    #[error("path has no segments")]
    NoSegments,

    /// A `..` segment walked above the root
    #[error("'..' escapes the root")]
    EscapesRoot,

    /// An element of an explicit key was empty
    #[error("empty key element at position {0}")]
    EmptyElement(usize),

    /// A segment contained a NUL byte
    #[error("segment contains a NUL byte")]
    ContainsNul,
}

impl PathError {
    /// Stable reason code, e.g. for client-facing error payloads
    pub fn reason_code(&self) -> &'static str {
        match self {
            PathError::Empty => "empty_path",
            PathError::NoSegments => "no_segments",
            PathError::EscapesRoot => "escapes_root",
            PathError::EmptyElement(_) => "empty_element",
            PathError::ContainsNul => "contains_nul",
        }
    }
}

/// Canonical catalog identifier for a logical table
///
/// Ordered, non-empty sequence of non-empty elements. Equality, hashing and
/// ordering are by element sequence. Serialized as the element list and
/// validated by [`ContentKey::of`] when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ContentKey {
    elements: Vec<String>,
}

impl ContentKey {
    /// Build a key from explicit elements
    ///
    /// # Errors
    ///
    /// `PathError::NoSegments` for an empty list, `EmptyElement` for an empty
    /// element and `ContainsNul` for an element with a NUL byte.
    pub fn of<I, S>(elements: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements: Vec<String> = elements.into_iter().map(Into::into).collect();
        if elements.is_empty() {
            return Err(PathError::NoSegments);
        }
        for (i, element) in elements.iter().enumerate() {
            if element.is_empty() {
                return Err(PathError::EmptyElement(i));
            }
            if element.contains('\0') {
                return Err(PathError::ContainsNul);
            }
        }
        Ok(ContentKey { elements })
    }

    /// Key elements, outermost first
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Last element
    pub fn name(&self) -> &str {
        self.elements.last().map(String::as_str).unwrap_or_default()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether the key names a table-log directory
    pub fn is_table_log(&self) -> bool {
        self.name() == TABLE_LOG_DIR
    }
}

impl TryFrom<Vec<String>> for ContentKey {
    type Error = PathError;

    fn try_from(elements: Vec<String>) -> Result<Self, Self::Error> {
        ContentKey::of(elements)
    }
}

impl From<ContentKey> for Vec<String> {
    fn from(key: ContentKey) -> Self {
        key.elements
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&decode(self))
    }
}

const SCHEME_SEPARATOR: &str = "://";

/// Split off a URI scheme, returning `(scheme, rest)`
///
/// `file` is treated as "no scheme" since local paths and `file:` URIs
/// address the same files.
fn split_scheme(path: &str) -> (Option<&str>, &str) {
    if let Some(rest) = path.strip_prefix("file:") {
        return (None, rest);
    }
    match path.find(SCHEME_SEPARATOR) {
        Some(idx)
            if idx > 0
                && path[..idx]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') =>
        {
            (Some(&path[..idx]), &path[idx + SCHEME_SEPARATOR.len()..])
        }
        _ => (None, path),
    }
}

/// Encode a physical table path into its content key
///
/// Accepts either the table root or its `_delta_log` directory.
///
/// # Errors
///
/// `CatalogError::InvalidPath` if the path is empty, has no segments, escapes
/// the root via `..`, or contains a NUL byte.
pub fn encode(physical_path: &str) -> CatalogResult<ContentKey> {
    encode_elements(physical_path).map_err(|reason| CatalogError::invalid_path(physical_path, reason))
}

fn encode_elements(physical_path: &str) -> Result<ContentKey, PathError> {
    let trimmed = physical_path.trim();
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }
    if trimmed.contains('\0') {
        return Err(PathError::ContainsNul);
    }

    let normalized = trimmed.replace('\\', "/");
    let (scheme, rest) = split_scheme(&normalized);

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop().ok_or(PathError::EscapesRoot)?;
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return Err(PathError::NoSegments);
    }

    let mut elements = Vec::with_capacity(segments.len() + 2);
    if let Some(scheme) = scheme {
        elements.push(format!("{}{}", scheme.to_ascii_lowercase(), SCHEME_SEPARATOR));
    }
    elements.extend(segments.into_iter().map(str::to_string));
    if elements.last().map(String::as_str) != Some(TABLE_LOG_DIR) {
        elements.push(TABLE_LOG_DIR.to_string());
    }
    ContentKey::of(elements)
}

/// Render a content key back into an addressable path
///
/// Keys produced by [`encode`] decode to the table-log directory they came
/// from: `/abs/path/_delta_log` or `scheme://bucket/path/_delta_log`.
pub fn decode(key: &ContentKey) -> String {
    render(&key.elements)
}

/// Path of the table root (the key without its `_delta_log` element)
pub fn table_root(key: &ContentKey) -> String {
    match key.elements.split_last() {
        Some((last, root)) if last == TABLE_LOG_DIR => render(root),
        _ => render(&key.elements),
    }
}

fn render(elements: &[String]) -> String {
    match elements.split_first() {
        Some((scheme, rest)) if scheme.ends_with(SCHEME_SEPARATOR) => {
            format!("{}{}", scheme, rest.join("/"))
        }
        _ => format!("/{}", elements.join("/")),
    }
}
