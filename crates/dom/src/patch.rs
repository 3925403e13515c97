//! Incremental DOM patch protocol.
//!
//! Invariants:
//! - Patches are applied in order.
//! - References must point to live keys at the time they are used (except
//!   the `key` in create operations).
//! - `NodeKey::INVALID` is never valid in a patch stream.
//! - A node may have at most one parent; operations must not create cycles.
//! - Attribute order is preserved; appliers must not dedupe.

use std::sync::Arc;

/// Stable identity of one node within a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl NodeKey {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: NodeKey = NodeKey(0);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomPatch {
    /// Create a detached element node with initial attributes.
    CreateElement {
        key: NodeKey,
        name: Arc<str>,
        attributes: Vec<(Arc<str>, Option<String>)>,
    },
    /// Create a detached text node.
    CreateText { key: NodeKey, text: String },
    /// Append a child to the end of a parent's children list.
    AppendChild { parent: NodeKey, child: NodeKey },
    /// Insert a child before an existing sibling.
    InsertBefore {
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    },
    /// Remove a node and its entire subtree from the document.
    RemoveNode { key: NodeKey },
    /// Replace all attributes on an element node.
    SetAttributes {
        key: NodeKey,
        attributes: Vec<(Arc<str>, Option<String>)>,
    },
    /// Replace the text content of a text node.
    SetText { key: NodeKey, text: String },
}
