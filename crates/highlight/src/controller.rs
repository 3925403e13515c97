use crate::options::{HighlighterOptions, OptionsError};
use crate::style::{StyleError, StyleInjector, injector_for};
use bus::Subscribable;
use comments::CommentNode;
use dom::NodeKey;
use platform::{WeakWindow, Window};
use std::cell::Cell;
use std::rc::{Rc, Weak};
use thiserror::Error;

/// Why a [`CommentHighlighter`] could not be created.
#[derive(Debug, Error)]
pub enum HighlighterError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Style(#[from] StyleError),
}

/// The comments cleared together when `comment` is clicked, replies before
/// the comment they answer. Without `include_children` only `comment` itself.
pub fn clear_set(comment: &Rc<CommentNode>, include_children: bool) -> Vec<Rc<CommentNode>> {
    if !include_children {
        return vec![Rc::clone(comment)];
    }
    let mut out = Vec::new();
    let mut stack = vec![(Rc::clone(comment), false)];
    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            out.push(node);
            continue;
        }
        let replies = node.child_comments();
        stack.push((node, true));
        stack.extend(replies.into_iter().rev().map(|reply| (reply, false)));
    }
    out
}

/// Strip both marker classes from every element of the page that carries
/// either, tracked or not. Returns the number of elements changed.
pub fn teardown_all(window: &Window, options: &HighlighterOptions) -> usize {
    let marker = options.class_name.as_str();
    let transition = options.transition_class();
    let marked: Vec<NodeKey> = {
        let doc = window.document();
        doc.descendants(doc.root())
            .into_iter()
            .filter(|k| doc.has_class(*k, marker) || doc.has_class(*k, &transition))
            .collect()
    };
    log::debug!("removing all highlights ({} element(s))", marked.len());
    let mut doc = window.document_mut();
    for &key in &marked {
        for class in [marker, transition.as_str()] {
            if let Err(err) = doc.remove_class(key, class) {
                log::warn!("cannot remove {class} from {key:?}: {err}");
            }
        }
    }
    marked.len()
}

/// Applies and clears highlights on one page.
pub struct CommentHighlighter {
    window: Window,
    options: Rc<HighlighterOptions>,
    styles: Box<dyn StyleInjector>,
    disposed: Cell<bool>,
}

impl CommentHighlighter {
    /// Validate `options` and inject the style sheet through `styles`. On
    /// failure nothing is left behind.
    pub fn new(
        window: &Window,
        options: HighlighterOptions,
        styles: Box<dyn StyleInjector>,
    ) -> Result<Self, HighlighterError> {
        options.validate()?;
        styles.inject(window, &options)?;
        Ok(Self {
            window: window.clone(),
            options: Rc::new(options),
            styles,
            disposed: Cell::new(false),
        })
    }

    /// [`CommentHighlighter::new`] with the injector for the page's layout.
    pub fn for_page(window: &Window, options: HighlighterOptions) -> Result<Self, HighlighterError> {
        Self::new(window, options, injector_for(window))
    }

    pub fn options(&self) -> &HighlighterOptions {
        &self.options
    }

    /// Mark `comment`. Repeating the call is harmless: classes are only added.
    ///
    /// With `clear_on_click`, the next click on the comment removes the marker
    /// from its clear set at once and the transition class after
    /// [`HighlighterOptions::transition_delay`].
    pub fn highlight(&self, comment: &Rc<CommentNode>) {
        let options = &self.options;
        log::info!(
            "highlighting comment {} (posted {}, class {})",
            comment.id(),
            comment
                .posted_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".into()),
            options.class_name
        );
        {
            let mut doc = self.window.document_mut();
            let element = comment.element();
            if let Err(err) = doc
                .add_class(element, &options.class_name)
                .and_then(|_| doc.add_class(element, &options.transition_class()))
            {
                log::warn!("cannot highlight comment {}: {err}", comment.id());
                return;
            }
        }
        if !options.clear_on_click {
            return;
        }

        log::debug!("installing click listener on {}", comment.id());
        let weak: Weak<CommentNode> = Rc::downgrade(comment);
        let window = self.window.downgrade();
        let options = Rc::clone(&self.options);
        comment.on_click().once(move |_: &()| {
            let Some(comment) = weak.upgrade() else {
                return;
            };
            clear(&window, &options, &comment);
        });
    }

    /// Global teardown plus style sheet removal. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        log::debug!("disposing comment highlighter");
        teardown_all(&self.window, &self.options);
        self.styles.remove(&self.window);
    }
}

fn clear(window: &WeakWindow, options: &Rc<HighlighterOptions>, comment: &Rc<CommentNode>) {
    let Some(window) = window.upgrade() else {
        return;
    };
    log::info!("comment {} clicked", comment.id());
    let elements: Vec<NodeKey> = clear_set(comment, options.include_children)
        .iter()
        .map(|c| c.element())
        .collect();
    log::info!("clearing highlights ({} comment(s))", elements.len());
    {
        let mut doc = window.document_mut();
        for &element in &elements {
            match doc.remove_class(element, &options.class_name) {
                Ok(true) => {}
                Ok(false) => log::debug!("marker of {element:?} already cleared"),
                Err(err) => log::debug!("marker of {element:?} not cleared: {err}"),
            }
        }
    }

    let transition = options.transition_class();
    let weak = window.downgrade();
    window.timers().schedule(options.transition_delay(), move || {
        let Some(window) = weak.upgrade() else {
            return;
        };
        let mut doc = window.document_mut();
        let removed = elements
            .iter()
            .filter(|&&element| match doc.remove_class(element, &transition) {
                Ok(true) => true,
                Ok(false) => {
                    log::debug!("transition of {element:?} already cleared");
                    false
                }
                Err(err) => {
                    log::debug!("transition of {element:?} not cleared: {err}");
                    false
                }
            })
            .count();
        log::debug!("transition finished, {removed} transition class(es) removed");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use comments::{CommentThread, ThreadLayout};
    use core_types::ThreadId;
    use page_fixtures::{CommentFixture, FixturePage};

    #[test]
    fn clear_set_is_post_order() {
        let page = FixturePage::thread(
            &[CommentFixture::new("p")
                .reply(CommentFixture::new("g1").reply(CommentFixture::new("gg")))
                .reply(CommentFixture::new("g2"))],
            None,
        );
        let thread = CommentThread::open(&page.window, ThreadId::new("abc123"), ThreadLayout::default());
        let parent = thread.comment_by_id("p").unwrap();

        let ids: Vec<_> = clear_set(&parent, true).iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["gg", "g1", "g2", "p"]);
        assert_eq!(clear_set(&parent, false).len(), 1);
    }

    #[test]
    fn teardown_with_nothing_marked_is_a_no_op() {
        let page = FixturePage::thread(&[CommentFixture::new("a")], None);
        assert_eq!(teardown_all(&page.window, &HighlighterOptions::default()), 0);
    }
}
