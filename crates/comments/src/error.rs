use dom::NodeKey;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommentError {
    /// A comment element is missing the attribute that carries its identity.
    #[error("comment element {element:?} has no {attribute} attribute")]
    MissingIdentity { element: NodeKey, attribute: String },
}
