//! Node path identity
//!
//! A [`Path`] is the only thing that identifies a node within a [`crate::graph::StateGraph`].
//! Two nodes with the same path cannot coexist in one graph, and edges are stored as pairs
//! of paths rather than references to node objects — which is what lets the planner replace
//! a node's state without ever having to rewrite the edges touching it (see §4.4.2 of
//! `SPEC_FULL.md`).
//!
//! # Examples
//!
//! ```rust
//! use reconcile_core::path::Path;
//!
//! let root = Path::root();
//! assert_eq!(root.as_str(), "/");
//!
//! let child = Path::new("/extract/likes").unwrap();
//! assert_eq!(child.segments(), vec!["extract", "likes"]);
//! ```

use std::fmt;

/// An immutable, absolute, slash-delimited node identifier.
///
/// The root path is always `/`. Construction rejects relative paths and paths with empty
/// segments (e.g. `a//b`), since both would make path-based identity ambiguous.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(String);

impl Path {
    /// The root path, `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse an absolute, slash-delimited path.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` does not start with `/`, or contains an empty segment
    /// (e.g. `//child`, `/child/`).
    pub fn new(raw: impl Into<String>) -> Result<Self, String> {
        let raw = raw.into();
        if !raw.starts_with('/') {
            return Err(format!("path '{raw}' must be absolute (start with '/')"));
        }
        if raw == "/" {
            return Ok(Self(raw));
        }
        if raw.ends_with('/') || raw[1..].split('/').any(str::is_empty) {
            return Err(format!("path '{raw}' must not contain empty segments"));
        }
        Ok(Self(raw))
    }

    /// The canonical string form of this path, e.g. `/extract/likes`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path split into segments, e.g. `/extract/likes` → `["extract", "likes"]`.
    ///
    /// The root path splits into an empty vector.
    pub fn segments(&self) -> Vec<&str> {
        if self.0 == "/" {
            Vec::new()
        } else {
            self.0[1..].split('/').collect()
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
