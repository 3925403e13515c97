use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Stable, externally assigned identity of one comment (e.g. `t1_abc123`).
///
/// Unique within a thread and immutable for the lifetime of the comment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommentId(Arc<str>);

impl CommentId {
    pub fn new(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CommentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CommentId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Identity of one discussion thread, derived from the page address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThreadId(Arc<str>);

impl ThreadId {
    pub fn new(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which markup flavour the current page is served in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageVariant {
    Classic,
    Redesign,
    Mobile,
}
