use crate::error::DomPatchError;
use crate::mutation::{MutationRecord, ObserveOptions, ObserverId, Registration};
use crate::patch::{DomPatch, NodeKey};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub(crate) enum NodeKind {
    Document,
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, Option<String>)>,
    },
    Text {
        text: String,
    },
}

pub(crate) struct NodeRecord {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Document | NodeKind::Element { .. })
    }
}

/// A mutable document tree.
///
/// Keys are never reused: once a key has been allocated it stays retired even
/// after its node is removed.
pub struct Document {
    pub(crate) nodes: HashMap<NodeKey, NodeRecord>,
    retired: HashSet<NodeKey>,
    root: NodeKey,
    next_key: u32,
    observers: Vec<Registration>,
    next_observer: u64,
}

impl Document {
    /// Create a document with an `html` element holding empty `head` and `body`.
    pub fn new() -> Self {
        let root = NodeKey(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeRecord {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            },
        );
        let mut doc = Self {
            nodes,
            retired: HashSet::new(),
            root,
            next_key: 2,
            observers: Vec::new(),
            next_observer: 1,
        };
        let html = doc.create_element("html", Vec::new());
        let head = doc.create_element("head", Vec::new());
        let body = doc.create_element("body", Vec::new());
        for (parent, child) in [(root, html), (html, head), (html, body)] {
            doc.link_child(parent, child, None);
        }
        doc
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn allocate_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    // --- Patch application ---

    pub fn apply(&mut self, patches: &[DomPatch]) -> Result<(), DomPatchError> {
        for patch in patches {
            self.apply_one(patch)?;
        }
        Ok(())
    }

    fn apply_one(&mut self, patch: &DomPatch) -> Result<(), DomPatchError> {
        match patch {
            DomPatch::CreateElement {
                key,
                name,
                attributes,
            } => self.insert_node(
                *key,
                NodeKind::Element {
                    name: Arc::clone(name),
                    attributes: attributes.clone(),
                },
            ),
            DomPatch::CreateText { key, text } => {
                self.insert_node(*key, NodeKind::Text { text: text.clone() })
            }
            DomPatch::AppendChild { parent, child } => self.append_child(*parent, *child),
            DomPatch::InsertBefore {
                parent,
                child,
                before,
            } => self.insert_before(*parent, *child, *before),
            DomPatch::RemoveNode { key } => self.remove_node(*key),
            DomPatch::SetAttributes { key, attributes } => self.set_attributes(*key, attributes),
            DomPatch::SetText { key, text } => self.set_text(*key, text),
        }
    }

    // --- Structural mutation ---

    /// Create a detached element and return its key.
    pub fn create_element(
        &mut self,
        name: &str,
        attributes: Vec<(Arc<str>, Option<String>)>,
    ) -> NodeKey {
        let key = self.allocate_key();
        self.nodes.insert(
            key,
            NodeRecord {
                kind: NodeKind::Element {
                    name: Arc::from(name.to_ascii_lowercase()),
                    attributes,
                },
                parent: None,
                children: Vec::new(),
            },
        );
        key
    }

    /// Create a detached text node and return its key.
    pub fn create_text(&mut self, text: &str) -> NodeKey {
        let key = self.allocate_key();
        self.nodes.insert(
            key,
            NodeRecord {
                kind: NodeKind::Text {
                    text: text.to_string(),
                },
                parent: None,
                children: Vec::new(),
            },
        );
        key
    }

    fn insert_node(&mut self, key: NodeKey, kind: NodeKind) -> Result<(), DomPatchError> {
        ensure_key(key)?;
        if self.nodes.contains_key(&key) || self.retired.contains(&key) {
            return Err(DomPatchError::DuplicateKey(key));
        }
        self.nodes.insert(
            key,
            NodeRecord {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        self.next_key = self.next_key.max(key.0 + 1);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomPatchError> {
        self.check_link(parent, child)?;
        self.link_child(parent, child, None);
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    ) -> Result<(), DomPatchError> {
        self.check_link(parent, child)?;
        let sibling = self.record(before)?;
        if sibling.parent != Some(parent) {
            return Err(DomPatchError::InvalidSibling { parent, before });
        }
        self.link_child(parent, child, Some(before));
        Ok(())
    }

    fn check_link(&self, parent: NodeKey, child: NodeKey) -> Result<(), DomPatchError> {
        let parent_record = self.record(parent)?;
        let child_record = self.record(child)?;
        if parent == child || self.is_inclusive_ancestor(child, parent) {
            return Err(DomPatchError::CycleDetected { parent, child });
        }
        if !parent_record.allows_children() {
            return Err(DomPatchError::InvalidParent(parent));
        }
        if child_record.parent.is_some() || child == self.root {
            return Err(DomPatchError::InvalidParent(child));
        }
        Ok(())
    }

    fn link_child(&mut self, parent: NodeKey, child: NodeKey, before: Option<NodeKey>) {
        if let Some(record) = self.nodes.get_mut(&parent) {
            let pos = before
                .and_then(|b| record.children.iter().position(|k| *k == b))
                .unwrap_or(record.children.len());
            record.children.insert(pos, child);
        }
        if let Some(record) = self.nodes.get_mut(&child) {
            record.parent = Some(parent);
        }
        self.record_child_list(parent, vec![child], Vec::new());
    }

    /// Remove `key` and its entire subtree.
    pub fn remove_node(&mut self, key: NodeKey) -> Result<(), DomPatchError> {
        ensure_key(key)?;
        if key == self.root {
            return Err(DomPatchError::RootRemoval);
        }
        let parent = self.record(key)?.parent;
        if let Some(parent) = parent {
            self.record_child_list(parent, Vec::new(), vec![key]);
            if let Some(record) = self.nodes.get_mut(&parent) {
                record.children.retain(|k| *k != key);
            }
        }
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(record) = self.nodes.remove(&current) {
                stack.extend(record.children);
                self.retired.insert(current);
            }
        }
        Ok(())
    }

    // --- Attribute mutation ---

    pub fn set_attributes(
        &mut self,
        key: NodeKey,
        attributes: &[(Arc<str>, Option<String>)],
    ) -> Result<(), DomPatchError> {
        let changed: Vec<String> = {
            let existing = self.attributes_mut(key)?;
            let mut changed: Vec<String> = Vec::new();
            for (name, _) in existing.iter().chain(attributes.iter()) {
                if changed.iter().any(|c| c.eq_ignore_ascii_case(name)) {
                    continue;
                }
                if existing_value(existing, name) != existing_value(attributes, name) {
                    changed.push(name.to_string());
                }
            }
            *existing = attributes.to_vec();
            changed
        };
        for name in changed {
            self.record_attribute(key, &name);
        }
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        key: NodeKey,
        name: &str,
        value: &str,
    ) -> Result<(), DomPatchError> {
        let attributes = self.attributes_mut(key)?;
        match attributes
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => *slot = Some(value.to_string()),
            None => attributes.push((Arc::from(name), Some(value.to_string()))),
        }
        self.record_attribute(key, name);
        Ok(())
    }

    pub fn set_text(&mut self, key: NodeKey, text: &str) -> Result<(), DomPatchError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Text { text: existing } => {
                existing.clear();
                existing.push_str(text);
                Ok(())
            }
            _ => Err(DomPatchError::WrongNodeKind(key)),
        }
    }

    /// Add `class` to the element's class list. Returns `false` if it was already present.
    pub fn add_class(&mut self, key: NodeKey, class: &str) -> Result<bool, DomPatchError> {
        ensure_class_token(class)?;
        if self.has_class(key, class) {
            self.element_name(key)?;
            return Ok(false);
        }
        let mut classes: Vec<String> = self.class_list(key).map(str::to_string).collect();
        classes.push(class.to_string());
        self.set_attribute(key, "class", &classes.join(" "))?;
        Ok(true)
    }

    /// Remove `class` from the element's class list. Returns `false` if it was absent.
    pub fn remove_class(&mut self, key: NodeKey, class: &str) -> Result<bool, DomPatchError> {
        ensure_class_token(class)?;
        if !self.has_class(key, class) {
            self.element_name(key)?;
            return Ok(false);
        }
        let classes: Vec<&str> = self.class_list(key).filter(|c| *c != class).collect();
        let joined = classes.join(" ");
        self.set_attribute(key, "class", &joined)?;
        Ok(true)
    }

    // --- Observation ---

    /// Start queueing records for changes matching `options` at or under `target`.
    ///
    /// Records are queued from the moment this returns.
    pub fn observe(&mut self, target: NodeKey, options: ObserveOptions) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Registration {
            id,
            target,
            options,
            queue: Vec::new(),
        });
        log::trace!("observer {id:?} registered on {target:?}");
        id
    }

    /// Stop observing and drop any queued records. Returns `false` if `id` was unknown.
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|r| r.id != id);
        before != self.observers.len()
    }

    /// Drain queued records, one batch per observer with pending records,
    /// in registration order.
    pub fn take_records(&mut self) -> Vec<(ObserverId, Vec<MutationRecord>)> {
        self.observers
            .iter_mut()
            .filter(|r| !r.queue.is_empty())
            .map(|r| (r.id, std::mem::take(&mut r.queue)))
            .collect()
    }

    pub fn has_pending_records(&self) -> bool {
        self.observers.iter().any(|r| !r.queue.is_empty())
    }

    fn record_child_list(&mut self, target: NodeKey, added: Vec<NodeKey>, removed: Vec<NodeKey>) {
        let interested: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, r)| r.options.child_list && self.observes(r, target))
            .map(|(i, _)| i)
            .collect();
        for index in interested {
            self.observers[index].queue.push(MutationRecord::ChildList {
                target,
                added: added.clone(),
                removed: removed.clone(),
            });
        }
    }

    fn record_attribute(&mut self, target: NodeKey, name: &str) {
        let interested: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, r)| r.options.wants_attribute(name) && self.observes(r, target))
            .map(|(i, _)| i)
            .collect();
        for index in interested {
            self.observers[index].queue.push(MutationRecord::Attributes {
                target,
                name: name.to_string(),
            });
        }
    }

    fn observes(&self, registration: &Registration, target: NodeKey) -> bool {
        registration.target == target
            || (registration.options.subtree
                && self.is_inclusive_ancestor(registration.target, target))
    }

    // --- Internals ---

    pub(crate) fn record(&self, key: NodeKey) -> Result<&NodeRecord, DomPatchError> {
        ensure_key(key)?;
        self.nodes.get(&key).ok_or(DomPatchError::MissingKey(key))
    }

    fn record_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, DomPatchError> {
        ensure_key(key)?;
        self.nodes.get_mut(&key).ok_or(DomPatchError::MissingKey(key))
    }

    fn attributes_mut(
        &mut self,
        key: NodeKey,
    ) -> Result<&mut Vec<(Arc<str>, Option<String>)>, DomPatchError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            _ => Err(DomPatchError::WrongNodeKind(key)),
        }
    }

    pub(crate) fn element_name(&self, key: NodeKey) -> Result<&str, DomPatchError> {
        match &self.record(key)?.kind {
            NodeKind::Element { name, .. } => Ok(name),
            _ => Err(DomPatchError::WrongNodeKind(key)),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_key(key: NodeKey) -> Result<(), DomPatchError> {
    if key == NodeKey::INVALID {
        return Err(DomPatchError::InvalidKey(key));
    }
    Ok(())
}

/// A class token is non-empty and free of ASCII whitespace.
fn ensure_class_token(class: &str) -> Result<(), DomPatchError> {
    if class.is_empty() || class.contains(|c: char| c.is_ascii_whitespace()) {
        return Err(DomPatchError::InvalidClassToken(class.to_string()));
    }
    Ok(())
}

fn existing_value<'a>(
    attributes: &'a [(Arc<str>, Option<String>)],
    name: &str,
) -> Option<Option<&'a str>> {
    attributes
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_deref())
}
