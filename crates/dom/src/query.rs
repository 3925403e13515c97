use crate::document::{Document, NodeKind};
use crate::patch::NodeKey;

/// Read-only traversal and lookup.
///
/// Every query tolerates dead keys: a key that is no longer live simply has no
/// attributes, classes, parent or children.
impl Document {
    pub fn document_element(&self) -> Option<NodeKey> {
        self.element_children(self.root()).next()
    }

    pub fn head(&self) -> Option<NodeKey> {
        let html = self.document_element()?;
        self.element_children(html)
            .find(|k| self.tag_name(*k) == Some("head"))
    }

    pub fn body(&self) -> Option<NodeKey> {
        let html = self.document_element()?;
        self.element_children(html)
            .find(|k| self.tag_name(*k) == Some("body"))
    }

    pub fn is_element(&self, key: NodeKey) -> bool {
        self.element_name(key).is_ok()
    }

    pub fn tag_name(&self, key: NodeKey) -> Option<&str> {
        self.element_name(key).ok()
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|r| r.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&key)
            .map(|r| r.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.children(key)
            .iter()
            .copied()
            .filter(|k| self.is_element(*k))
    }

    pub fn first_element_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.element_children(key).next()
    }

    /// Attribute value; a valueless attribute reads as `""`.
    pub fn attribute(&self, key: NodeKey, name: &str) -> Option<&str> {
        let record = self.nodes.get(&key)?;
        let NodeKind::Element { attributes, .. } = &record.kind else {
            return None;
        };
        attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn class_list(&self, key: NodeKey) -> impl Iterator<Item = &str> + '_ {
        self.attribute(key, "class")
            .unwrap_or("")
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, key: NodeKey, class: &str) -> bool {
        self.class_list(key).any(|c| c == class)
    }

    /// `true` if `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = Some(node);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.parent(key);
        }
        false
    }

    /// `true` if `key` is attached to the document tree.
    pub fn is_connected(&self, key: NodeKey) -> bool {
        self.contains(key) && self.is_inclusive_ancestor(self.root(), key)
    }

    /// Nearest inclusive ancestor element carrying `class`.
    pub fn closest_with_class(&self, key: NodeKey, class: &str) -> Option<NodeKey> {
        let mut current = Some(key);
        while let Some(k) = current {
            if self.has_class(k, class) {
                return Some(k);
            }
            current = self.parent(k);
        }
        None
    }

    /// All descendants of `key` (excluding `key`) in document order.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(key).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Descendant elements of `key` carrying `class`, in document order.
    pub fn elements_by_class(&self, key: NodeKey, class: &str) -> Vec<NodeKey> {
        self.elements_by_classes(key, &[class])
    }

    /// Descendant elements of `key` carrying every class in `classes`, in document order.
    pub fn elements_by_classes(&self, key: NodeKey, classes: &[&str]) -> Vec<NodeKey> {
        self.descendants(key)
            .into_iter()
            .filter(|k| classes.iter().all(|c| self.has_class(*k, c)))
            .collect()
    }

    /// Descendant elements of `key` with tag `name`, in document order.
    pub fn elements_by_tag(&self, key: NodeKey, name: &str) -> Vec<NodeKey> {
        self.descendants(key)
            .into_iter()
            .filter(|k| self.tag_name(*k).is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .collect()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeKey> {
        self.descendants(self.root())
            .into_iter()
            .find(|k| self.attribute(*k, "id") == Some(id))
    }

    /// Follow a chain of direct-child class steps from `key`.
    ///
    /// `child_chain(k, &["child", "listing", "comment"])` is the equivalent of
    /// the selector `k > .child > .listing > .comment`.
    pub fn child_chain(&self, key: NodeKey, classes: &[&str]) -> Vec<NodeKey> {
        let mut frontier = vec![key];
        for class in classes {
            frontier = frontier
                .iter()
                .flat_map(|k| self.element_children(*k))
                .filter(|k| self.has_class(*k, class))
                .collect();
            if frontier.is_empty() {
                break;
            }
        }
        frontier
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        for k in std::iter::once(key).chain(self.descendants(key)) {
            if let Some(NodeKind::Text { text }) = self.nodes.get(&k).map(|r| &r.kind) {
                out.push_str(text);
            }
        }
        out
    }
}
