// Copyright (c) 2025 - Cowboy AI, Inc.
//! Department Tree Paths
//!
//! The CMDB names a department with a dotted path (`Region.Team.Sub`) and
//! lists several of them comma-joined on a single host or user. JumpServer
//! stores the same tree as slash-separated node paths under a fixed root
//! (`/DEFAULT/C3/Region/Team/Sub`).
//!
//! ```text
//! "A.B, A.C"  ──parse──>  PathSet {A.B, A.C}
//!                              │
//!          minimal_cover ◄─────┼─────► full_expansion
//!          {A.B, A.C}          │       {A, A.B, A.C}
//!                              ▼
//!                         PathCodec::to_remote
//!                         /DEFAULT/C3/A/B
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default JumpServer subtree managed by the sync
pub const DEFAULT_ROOT_PATH: &str = "/DEFAULT/C3";

/// Path validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Department path is empty")]
    Empty,

    #[error("Department path has an empty segment: {0}")]
    EmptySegment(String),

    #[error("Department path contains '/': {0}")]
    InvalidCharacter(String),

    #[error("Remote path {path} is not under root {root}")]
    OutsideRoot { path: String, root: String },

    #[error("Invalid root path: {0}")]
    InvalidRoot(String),
}

/// One CMDB department, e.g. `Region.Team.Sub`
///
/// Invariants:
/// - Non-empty
/// - No empty segments
/// - No `/` (it would not survive the round trip through [`PathCodec`])
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DottedPath(String);

impl DottedPath {
    pub const SEPARATOR: char = '.';

    pub fn new(path: impl Into<String>) -> Result<Self, PathError> {
        let path = path.into();
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        if path.contains('/') {
            return Err(PathError::InvalidCharacter(path));
        }
        if path.split(Self::SEPARATOR).any(str::is_empty) {
            return Err(PathError::EmptySegment(path));
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR)
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Last segment, used as the JumpServer node short name
    pub fn name(&self) -> &str {
        self.0
            .rsplit(Self::SEPARATOR)
            .next()
            .unwrap_or(self.0.as_str())
    }

    /// Every non-empty leading prefix, shortest first, ending with `self`
    pub fn prefixes(&self) -> Vec<DottedPath> {
        let mut prefixes = Vec::with_capacity(self.depth());
        for (idx, ch) in self.0.char_indices() {
            if ch == Self::SEPARATOR {
                prefixes.push(Self(self.0[..idx].to_string()));
            }
        }
        prefixes.push(self.clone());
        prefixes
    }

    /// True when `self` is a strict segment prefix of `other`
    pub fn is_strict_prefix_of(&self, other: &DottedPath) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0[self.0.len()..].starts_with(Self::SEPARATOR)
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DottedPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DottedPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DottedPath> for String {
    fn from(path: DottedPath) -> Self {
        path.0
    }
}

/// A JumpServer node `full_value`, e.g. `/DEFAULT/C3/Region/Team`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemotePath(String);

impl RemotePath {
    pub const SEPARATOR: char = '/';

    /// Wrap a path reported by the remote store. No validation: the store
    /// owns its own tree, including nodes outside the managed root.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment
    pub fn name(&self) -> &str {
        self.0.rsplit(Self::SEPARATOR).next().unwrap_or("")
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bidirectional mapping between CMDB dotted paths and JumpServer node paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCodec {
    root: String,
}

impl PathCodec {
    /// Create a codec rooted at `root`.
    ///
    /// # Invariants
    /// - Starts with `/`
    /// - No trailing `/`
    /// - No empty segments
    pub fn new(root: impl Into<String>) -> Result<Self, PathError> {
        let root = root.into();
        let valid = root.starts_with(RemotePath::SEPARATOR)
            && root.len() > 1
            && root[1..].split(RemotePath::SEPARATOR).all(|s| !s.is_empty());
        if !valid {
            return Err(PathError::InvalidRoot(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// `A.B` → `<root>/A/B`
    pub fn to_remote(&self, path: &DottedPath) -> RemotePath {
        RemotePath(format!(
            "{}{}{}",
            self.root,
            RemotePath::SEPARATOR,
            path.as_str()
                .replace(DottedPath::SEPARATOR, &RemotePath::SEPARATOR.to_string())
        ))
    }

    /// `<root>/A/B` → `A.B`
    ///
    /// Paths outside the root (including the root itself) are rejected.
    pub fn to_dotted(&self, path: &RemotePath) -> Result<DottedPath, PathError> {
        let relative = self
            .relative(path)
            .ok_or_else(|| PathError::OutsideRoot {
                path: path.to_string(),
                root: self.root.clone(),
            })?;
        DottedPath::new(relative.replace(RemotePath::SEPARATOR, "."))
    }

    /// True for strict descendants of the root
    pub fn is_managed(&self, path: &RemotePath) -> bool {
        self.relative(path).is_some()
    }

    fn relative<'a>(&self, path: &'a RemotePath) -> Option<&'a str> {
        path.as_str()
            .strip_prefix(self.root.as_str())
            .and_then(|rest| rest.strip_prefix(RemotePath::SEPARATOR))
            .filter(|rest| !rest.is_empty())
    }
}

impl Default for PathCodec {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT_PATH.to_string(),
        }
    }
}

/// A set of department paths
///
/// Ordered so plans and logs are deterministic; the algebra itself is
/// order-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathSet(BTreeSet<DottedPath>);

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-joined CMDB field such as `"A.B, A.C"`.
    ///
    /// Tokens are trimmed and blanks ignored. Malformed tokens are returned
    /// separately so the caller decides whether to log or fail.
    pub fn parse_lenient(field: &str) -> (Self, Vec<PathError>) {
        let mut set = Self::new();
        let mut errors = Vec::new();
        for token in field.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match DottedPath::new(token) {
                Ok(path) => {
                    set.insert(path);
                }
                Err(e) => errors.push(e),
            }
        }
        (set, errors)
    }

    /// Strict variant of [`PathSet::parse_lenient`]
    pub fn parse(field: &str) -> Result<Self, PathError> {
        let (set, mut errors) = Self::parse_lenient(field);
        match errors.pop() {
            Some(e) => Err(e),
            None => Ok(set),
        }
    }

    pub fn insert(&mut self, path: DottedPath) -> bool {
        self.0.insert(path)
    }

    pub fn contains(&self, path: &DottedPath) -> bool {
        self.0.contains(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DottedPath> {
        self.0.iter()
    }

    /// Keep only the deepest member of every branch.
    ///
    /// A path is dropped when another member extends it:
    /// `{A, A.B, A.C, X}` → `{A.B, A.C, X}`.
    pub fn minimal_cover(&self) -> PathSet {
        let mut implied = BTreeSet::new();
        for path in &self.0 {
            let prefixes = path.prefixes();
            for prefix in &prefixes[..prefixes.len() - 1] {
                if self.0.contains(prefix) {
                    implied.insert(prefix.clone());
                }
            }
        }
        PathSet(self.0.difference(&implied).cloned().collect())
    }

    /// Ancestor closure: every non-empty prefix of every member.
    ///
    /// `{A.B.C}` → `{A, A.B, A.B.C}`
    pub fn full_expansion(&self) -> PathSet {
        PathSet(self.0.iter().flat_map(DottedPath::prefixes).collect())
    }

    /// Members ordered parent-before-child
    pub fn shortest_first(&self) -> Vec<&DottedPath> {
        let mut paths: Vec<_> = self.0.iter().collect();
        paths.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.cmp(b)));
        paths
    }
}

impl FromIterator<DottedPath> for PathSet {
    fn from_iter<I: IntoIterator<Item = DottedPath>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<DottedPath> for PathSet {
    fn extend<I: IntoIterator<Item = DottedPath>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl IntoIterator for PathSet {
    type Item = DottedPath;
    type IntoIter = std::collections::btree_set::IntoIter<DottedPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a DottedPath;
    type IntoIter = std::collections::btree_set::Iter<'a, DottedPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
