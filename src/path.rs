//! Content-addressed identity for operations.
//!
//! A [`Path`] is a sequence of [`PathToken`]s. Two operations that produce
//! the same path share a [`crate::store::Store`] and therefore share state,
//! in-flight tasks, and subscribers. Prefix relationships between paths
//! drive cache invalidation and subtree queries in [`crate::client::Client`].

use std::fmt;
use std::ops::{Index, Range};
use uuid::Uuid;

/// A single segment of a [`Path`].
///
/// `Nested` lets one operation's identity embed another's wholesale, which
/// is how list-of-detail relationships (e.g. a user's list of post paths)
/// stay addressable without a string-concatenation scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathToken {
    String(String),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
    Blob(Vec<u8>),
    Nested(Path),
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathToken::String(s) => write!(f, "{s}"),
            PathToken::Int(i) => write!(f, "{i}"),
            PathToken::Bool(b) => write!(f, "{b}"),
            PathToken::Uuid(u) => write!(f, "{u}"),
            PathToken::Blob(b) => write!(f, "blob({} bytes)", b.len()),
            PathToken::Nested(p) => write!(f, "({p})"),
        }
    }
}

impl From<&str> for PathToken {
    fn from(value: &str) -> Self {
        PathToken::String(value.to_string())
    }
}
impl From<String> for PathToken {
    fn from(value: String) -> Self {
        PathToken::String(value)
    }
}
impl From<i64> for PathToken {
    fn from(value: i64) -> Self {
        PathToken::Int(value)
    }
}
impl From<bool> for PathToken {
    fn from(value: bool) -> Self {
        PathToken::Bool(value)
    }
}
impl From<Uuid> for PathToken {
    fn from(value: Uuid) -> Self {
        PathToken::Uuid(value)
    }
}
impl From<Vec<u8>> for PathToken {
    fn from(value: Vec<u8>) -> Self {
        PathToken::Blob(value)
    }
}
impl From<Path> for PathToken {
    fn from(value: Path) -> Self {
        PathToken::Nested(value)
    }
}

/// An ordered, hashable identity for an operation.
///
/// Indexing past the end panics with the literal message
/// `"OperationPath index out of range"` rather than returning an `Option`,
/// matching the engine's convention that malformed path construction is a
/// programmer error to be caught in testing, not a runtime branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathToken>);

const OUT_OF_RANGE: &str = "OperationPath index out of range";

impl Path {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_token(token: impl Into<PathToken>) -> Self {
        Self(vec![token.into()])
    }

    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<PathToken>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> &[PathToken] {
        &self.0
    }

    /// Returns a new path with `other`'s tokens appended after this one's.
    pub fn appending(&self, other: &Path) -> Path {
        let mut tokens = self.0.clone();
        tokens.extend(other.0.iter().cloned());
        Path(tokens)
    }

    pub fn appending_token(&self, token: impl Into<PathToken>) -> Path {
        let mut tokens = self.0.clone();
        tokens.push(token.into());
        Path(tokens)
    }

    /// `true` if `self` is a prefix of `other` (equal paths count as prefixes).
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        self.0.len() <= other.0.len() && self.0.iter().zip(other.0.iter()).all(|(a, b)| a == b)
    }

    /// Replaces the tokens in `range` with `replacement`, panicking with
    /// [`OUT_OF_RANGE`] if `range` does not fit within the current length.
    pub fn replacing_subrange<I, T>(&self, range: Range<usize>, replacement: I) -> Path
    where
        I: IntoIterator<Item = T>,
        T: Into<PathToken>,
    {
        if range.start > self.0.len() || range.end > self.0.len() || range.start > range.end {
            panic!("{OUT_OF_RANGE}");
        }
        let mut tokens = self.0.clone();
        tokens.splice(range, replacement.into_iter().map(Into::into));
        Path(tokens)
    }
}

impl Index<usize> for Path {
    type Output = PathToken;

    fn index(&self, index: usize) -> &PathToken {
        self.0.get(index).unwrap_or_else(|| panic!("{OUT_OF_RANGE}"))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/")?;
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}
