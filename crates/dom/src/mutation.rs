use crate::patch::NodeKey;

/// Identifies one observer registration on a [`Document`](crate::Document).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

/// One observed change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationRecord {
    /// Children were inserted into or removed from `target`.
    ChildList {
        target: NodeKey,
        added: Vec<NodeKey>,
        removed: Vec<NodeKey>,
    },
    /// Attribute `name` of `target` changed.
    Attributes { target: NodeKey, name: String },
}

impl MutationRecord {
    pub fn target(&self) -> NodeKey {
        match self {
            MutationRecord::ChildList { target, .. } => *target,
            MutationRecord::Attributes { target, .. } => *target,
        }
    }
}

/// Which changes an observer wants to hear about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    /// Restricts attribute records to these names. `None` means all attributes.
    pub attribute_filter: Option<Vec<String>>,
}

impl ObserveOptions {
    /// Child insertions/removals anywhere under the target.
    pub fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Self::default()
        }
    }

    /// Changes to the named attributes of the target itself.
    pub fn attributes_of(names: &[&str]) -> Self {
        Self {
            attributes: true,
            attribute_filter: Some(names.iter().map(|n| n.to_string()).collect()),
            ..Self::default()
        }
    }

    pub(crate) fn wants_attribute(&self, name: &str) -> bool {
        self.attributes
            && self
                .attribute_filter
                .as_ref()
                .is_none_or(|filter| filter.iter().any(|n| n.eq_ignore_ascii_case(name)))
    }
}

pub(crate) struct Registration {
    pub(crate) id: ObserverId,
    pub(crate) target: NodeKey,
    pub(crate) options: ObserveOptions,
    pub(crate) queue: Vec<MutationRecord>,
}
