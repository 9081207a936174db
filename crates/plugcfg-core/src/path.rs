//! # Configuration Paths
//!
//! A [`ConfigPath`] locates a node inside a configuration document as an
//! ordered sequence of mapping keys and sequence indices, starting at the
//! document root.
//!
//! ## Invariant
//!
//! Paths are the single join key of the pipeline. The synthesizer, the
//! document builder, the annotation co-traversal and the validator all
//! address nodes with the same `ConfigPath`, and its textual form is an
//! RFC 6901 JSON pointer (`/upstream/nodes/0/host`). The validation engine
//! reports instance locations as JSON pointers too, so failures parse back
//! into the same type with [`ConfigPath::from_pointer`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// One step of a [`ConfigPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A mapping key.
    Key(String),
    /// A sequence index.
    Index(usize),
}

impl PathSegment {
    /// The segment as a mapping key. Indices render as their decimal form.
    pub fn as_key(&self) -> String {
        match self {
            Self::Key(k) => k.clone(),
            Self::Index(i) => i.to_string(),
        }
    }

    /// The segment as a sequence index, if it is one or is an all-digit key.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Key(k) => k.parse().ok(),
        }
    }

    /// True if this segment names the given mapping key.
    pub fn is_key(&self, key: &str) -> bool {
        matches!(self, Self::Key(k) if k == key)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{}", k.replace('~', "~0").replace('/', "~1")),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location of a node relative to the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigPath(Vec<PathSegment>);

impl ConfigPath {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse an RFC 6901 JSON pointer.
    ///
    /// All-digit segments become [`PathSegment::Index`]; everything else is a
    /// [`PathSegment::Key`]. The empty string is the root.
    ///
    /// # Errors
    ///
    /// Returns `PathError::MissingLeadingSlash` for a non-empty pointer that
    /// does not start with `/`, and `PathError::InvalidEscape` for a `~` not
    /// followed by `0` or `1`.
    pub fn from_pointer(pointer: &str) -> Result<Self, PathError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let rest = pointer
            .strip_prefix('/')
            .ok_or_else(|| PathError::MissingLeadingSlash(pointer.to_string()))?;

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            let key = unescape(raw).ok_or_else(|| PathError::InvalidEscape(pointer.to_string()))?;
            let is_index = !key.is_empty()
                && key.bytes().all(|b| b.is_ascii_digit())
                && (key == "0" || !key.starts_with('0'));
            match key.parse::<usize>() {
                Ok(index) if is_index => segments.push(PathSegment::Index(index)),
                _ => segments.push(PathSegment::Key(key)),
            }
        }
        Ok(Self(segments))
    }

    /// Render as an RFC 6901 JSON pointer (`""` for the root).
    pub fn to_pointer(&self) -> String {
        self.0.iter().map(|s| format!("/{s}")).collect()
    }

    /// A new path extended by one segment.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Remove and return the last segment.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// The last segment, or `None` at the root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// The path without its last segment, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    /// True for the empty path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the empty path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments from root to leaf.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Iterate over the segments from root to leaf.
    pub fn iter(&self) -> std::slice::Iter<'_, PathSegment> {
        self.0.iter()
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.to_pointer())
        }
    }
}

impl FromIterator<PathSegment> for ConfigPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ConfigPath {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Undo RFC 6901 escaping: `~1` → `/`, `~0` → `~`.
fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}
