use crate::document::Document;
use crate::patch::{DomPatch, NodeKey};
use std::sync::Arc;

/// Declarative description of a subtree to be inserted into a [`Document`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementSpec {
    name: Arc<str>,
    attributes: Vec<(Arc<str>, Option<String>)>,
    children: Vec<NodeSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeSpec {
    Element(ElementSpec),
    Text(String),
}

impl From<ElementSpec> for NodeSpec {
    fn from(spec: ElementSpec) -> Self {
        NodeSpec::Element(spec)
    }
}

impl ElementSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name.to_ascii_lowercase()),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        match self
            .attributes
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => *slot = Some(value.to_string()),
            None => self
                .attributes
                .push((Arc::from(name), Some(value.to_string()))),
        }
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Append `class` to the class attribute.
    pub fn class(self, class: &str) -> Self {
        let joined = match self.attribute("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.attr("class", &joined)
    }

    pub fn child(mut self, child: impl Into<NodeSpec>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children
            .extend(children.into_iter().map(NodeSpec::Element));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.children.push(NodeSpec::Text(text.to_string()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_deref())
    }
}

impl Document {
    /// Build the patch stream that inserts `spec` as the last child of `parent`.
    ///
    /// The subtree is assembled detached and attached with a single final
    /// `AppendChild`, so observers see one insertion for the whole subtree.
    pub fn patches_for(&mut self, parent: NodeKey, spec: &ElementSpec) -> (NodeKey, Vec<DomPatch>) {
        let mut patches = Vec::new();
        let key = self.emit_subtree(spec, &mut patches);
        patches.push(DomPatch::AppendChild { parent, child: key });
        (key, patches)
    }

    /// Like [`Document::patches_for`], inserting before the existing child `before`.
    pub fn patches_before(
        &mut self,
        parent: NodeKey,
        before: NodeKey,
        spec: &ElementSpec,
    ) -> (NodeKey, Vec<DomPatch>) {
        let mut patches = Vec::new();
        let key = self.emit_subtree(spec, &mut patches);
        patches.push(DomPatch::InsertBefore {
            parent,
            child: key,
            before,
        });
        (key, patches)
    }

    fn emit_subtree(&mut self, spec: &ElementSpec, out: &mut Vec<DomPatch>) -> NodeKey {
        let key = self.allocate_key();
        out.push(DomPatch::CreateElement {
            key,
            name: Arc::clone(&spec.name),
            attributes: spec.attributes.clone(),
        });
        for child in &spec.children {
            let child_key = match child {
                NodeSpec::Element(element) => self.emit_subtree(element, out),
                NodeSpec::Text(text) => {
                    let text_key = self.allocate_key();
                    out.push(DomPatch::CreateText {
                        key: text_key,
                        text: text.clone(),
                    });
                    text_key
                }
            };
            out.push(DomPatch::AppendChild {
                parent: key,
                child: child_key,
            });
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_appends_to_existing_value() {
        let spec = ElementSpec::new("DIV").class("thing").class("comment");
        assert_eq!(spec.attribute("class"), Some("thing comment"));
    }

    #[test]
    fn subtree_is_attached_last() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let spec = ElementSpec::new("div").child(ElementSpec::new("p").text("hi"));
        let (key, patches) = doc.patches_for(body, &spec);

        assert_eq!(
            patches.last(),
            Some(&DomPatch::AppendChild {
                parent: body,
                child: key
            })
        );
        doc.apply(&patches).unwrap();
        assert_eq!(doc.text_content(key), "hi");
        assert!(doc.is_connected(key));
    }
}
