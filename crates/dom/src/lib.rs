//! Live, externally mutated document model.
//!
//! The document is an arena of nodes addressed by [`NodeKey`]. It is mutated
//! either directly (class and attribute helpers) or through the incremental
//! [`DomPatch`] protocol, and every structural or attribute change is queued as
//! a [`MutationRecord`] for each observer whose registration matches it.

mod builder;
mod document;
mod error;
mod mutation;
mod patch;
mod query;

pub use crate::builder::{ElementSpec, NodeSpec};
pub use crate::document::Document;
pub use crate::error::DomPatchError;
pub use crate::mutation::{MutationRecord, ObserveOptions, ObserverId};
pub use crate::patch::{DomPatch, NodeKey};
