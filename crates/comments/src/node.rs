use crate::error::CommentError;
use crate::layout::ThreadLayout;
use crate::thread::CommentIndex;
use bus::{EventChannel, ListenerId, Subscribable};
use chrono::{DateTime, FixedOffset};
use core_types::CommentId;
use dom::{Document, NodeKey};
use platform::{ClickEvent, Window};
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Read the identity attribute of a comment element.
///
/// Fails with [`CommentError::MissingIdentity`] when the attribute is absent
/// or empty.
pub fn read_identity(
    doc: &Document,
    element: NodeKey,
    layout: &ThreadLayout,
) -> Result<CommentId, CommentError> {
    match doc.attribute(element, &layout.identity_attribute) {
        Some(raw) if !raw.is_empty() => Ok(CommentId::from(raw)),
        _ => Err(CommentError::MissingIdentity {
            element,
            attribute: layout.identity_attribute.clone(),
        }),
    }
}

/// Stable-identity wrapper around one comment element.
///
/// Created when the comment is first observed and disposed only together with
/// its owning [`CommentThread`](crate::CommentThread).
pub struct CommentNode {
    element: NodeKey,
    id: CommentId,
    window: Window,
    layout: Rc<ThreadLayout>,
    index: Weak<CommentIndex>,
    on_click: EventChannel<()>,
    click_listener: Cell<ListenerId>,
}

impl CommentNode {
    pub(crate) fn new(
        window: &Window,
        element: NodeKey,
        layout: &Rc<ThreadLayout>,
        index: &Rc<CommentIndex>,
    ) -> Result<Rc<Self>, CommentError> {
        let id = read_identity(&window.document(), element, layout)?;
        let on_click = EventChannel::new();
        let node = Rc::new(Self {
            element,
            id,
            window: window.clone(),
            layout: Rc::clone(layout),
            index: Rc::downgrade(index),
            on_click: on_click.clone(),
            click_listener: Cell::new(ListenerId::INERT),
        });

        let weak_window = window.downgrade();
        let comment_class = layout.comment_class.clone();
        let id = node.id.clone();
        let listener = window.clicks().subscribe(move |event: &ClickEvent| {
            let Some(window) = weak_window.upgrade() else {
                return;
            };
            let hit = window
                .document()
                .closest_with_class(event.target, &comment_class);
            if hit == Some(element) {
                log::debug!("comment {id} clicked");
                on_click.dispatch(&());
            }
        });
        node.click_listener.set(listener);
        Ok(node)
    }

    pub fn element(&self) -> NodeKey {
        self.element
    }

    pub fn id(&self) -> &CommentId {
        &self.id
    }

    /// `None` for deleted or redacted comments.
    pub fn author(&self) -> Option<String> {
        self.window
            .document()
            .attribute(self.element, &self.layout.author_attribute)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
    }

    /// Posting time from the first time element, e.g. `2014-02-20T00:41:27+00:00`.
    /// `None` when the comment is deleted or the value does not parse.
    pub fn posted_at(&self) -> Option<DateTime<FixedOffset>> {
        let doc = self.window.document();
        let time = *doc.elements_by_tag(self.element, &self.layout.time_tag).first()?;
        let raw = doc.attribute(time, &self.layout.time_attribute)?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                log::debug!("comment {}: unparsable time {raw:?}: {err}", self.id);
                None
            }
        }
    }

    /// Direct replies currently present under this comment, in document order.
    ///
    /// Replies are resolved through the owning thread; any reply the thread does
    /// not know (yet) is left out.
    pub fn child_comments(&self) -> Vec<Rc<CommentNode>> {
        let Some(index) = self.index.upgrade() else {
            return Vec::new();
        };
        let doc = self.window.document();
        let index = index.borrow();
        doc.child_chain(self.element, &self.layout.child_chain())
            .into_iter()
            .filter_map(|key| {
                let Ok(id) = read_identity(&doc, key, &self.layout) else {
                    log::debug!("reply {key:?} of {} has no identity, skipped", self.id);
                    return None;
                };
                let resolved = index.get(id.as_str()).cloned();
                if resolved.is_none() {
                    log::debug!("reply {id} of {} not resolved, skipped", self.id);
                }
                resolved
            })
            .collect()
    }

    pub fn on_click(&self) -> &EventChannel<()> {
        &self.on_click
    }

    pub(crate) fn dispose(&self) {
        self.on_click.dispose();
        self.window.clicks().unsubscribe(self.click_listener.replace(ListenerId::INERT));
    }
}

impl fmt::Debug for CommentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentNode")
            .field("id", &self.id)
            .field("element", &self.element)
            .finish()
    }
}
