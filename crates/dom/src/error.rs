use crate::patch::NodeKey;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomPatchError {
    #[error("invalid node key {0:?}")]
    InvalidKey(NodeKey),
    #[error("duplicate node key {0:?}")]
    DuplicateKey(NodeKey),
    #[error("missing node key {0:?}")]
    MissingKey(NodeKey),
    #[error("operation not valid for node kind of {0:?}")]
    WrongNodeKind(NodeKey),
    #[error("{0:?} cannot be used as a parent here")]
    InvalidParent(NodeKey),
    #[error("{before:?} is not a child of {parent:?}")]
    InvalidSibling { parent: NodeKey, before: NodeKey },
    #[error("appending {child:?} to {parent:?} would create a cycle")]
    CycleDetected { parent: NodeKey, child: NodeKey },
    #[error("the document root cannot be removed")]
    RootRemoval,
    #[error("the document has no <head> element")]
    MissingHead,
    #[error("{0:?} is not a valid class token")]
    InvalidClassToken(String),
}
