//! Context selectors for extraction calls.
//!
//! A context is an opaque tag; each field declares the contexts it is
//! visible in and each extraction call requests one or more of them.

use std::fmt;

/// Context requested when the caller does not name one.
pub const DEFAULT_CONTEXT: &str = "default";

/// The set of context tags requested by one extraction call.
///
/// Order of insertion is kept and duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contexts {
    tags: Vec<String>,
}

impl Contexts {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut contexts = Self { tags: Vec::new() };
        for tag in tags {
            contexts.push(tag);
        }
        contexts
    }

    pub fn single(tag: impl Into<String>) -> Self {
        Self {
            tags: vec![tag.into()],
        }
    }

    pub fn with(mut self, tag: impl Into<String>) -> Self {
        self.push(tag);
        self
    }

    fn push(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// True when at least one of `tags` is requested.
    pub fn intersects<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|tag| self.contains(tag.as_ref()))
    }

    pub fn overlaps(&self, other: &Contexts) -> bool {
        self.intersects(&other.tags)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for Contexts {
    fn default() -> Self {
        Self::single(DEFAULT_CONTEXT)
    }
}

impl fmt::Display for Contexts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tags.join(","))
    }
}

impl From<&str> for Contexts {
    fn from(tag: &str) -> Self {
        Self::single(tag)
    }
}

impl From<String> for Contexts {
    fn from(tag: String) -> Self {
        Self::single(tag)
    }
}

impl From<&String> for Contexts {
    fn from(tag: &String) -> Self {
        Self::single(tag.as_str())
    }
}

impl From<&Contexts> for Contexts {
    fn from(contexts: &Contexts) -> Self {
        contexts.clone()
    }
}

impl<S: Into<String>> From<Vec<S>> for Contexts {
    fn from(tags: Vec<S>) -> Self {
        Self::new(tags)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Contexts {
    fn from(tags: [S; N]) -> Self {
        Self::new(tags)
    }
}

impl From<&[&str]> for Contexts {
    fn from(tags: &[&str]) -> Self {
        Self::new(tags.iter().copied())
    }
}
