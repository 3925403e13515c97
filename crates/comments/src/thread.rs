use crate::layout::ThreadLayout;
use crate::node::{CommentNode, read_identity};
use bus::{EventChannel, Subscribable};
use core_types::{CommentId, ThreadId};
use dom::{MutationRecord, NodeKey, ObserveOptions};
use indexmap::IndexMap;
use platform::{MutationBatch, MutationObserver, Window};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

/// Identity → node mapping of one thread. Entries are only ever appended.
pub(crate) type CommentIndex = RefCell<IndexMap<CommentId, Rc<CommentNode>>>;

struct ThreadShared {
    window: Window,
    layout: Rc<ThreadLayout>,
    index: Rc<CommentIndex>,
    on_comment_added: EventChannel<Rc<CommentNode>>,
}

/// All comments of one discussion, kept in sync with the page.
///
/// Observation of the root listing starts in [`CommentThread::new`], before
/// anything is read, so no insertion can slip between the initial scan and
/// the first mutation batch. Comments that arrive later are registered once
/// per identity; re-inserting a known comment is ignored.
pub struct CommentThread {
    id: ThreadId,
    root: Option<NodeKey>,
    shared: Rc<ThreadShared>,
    observer: Option<MutationObserver>,
    disposed: Cell<bool>,
}

impl CommentThread {
    /// Start observing the thread's root listing without scanning it.
    ///
    /// A page without a root listing yields an inert thread: it never
    /// observes, never scans and never notifies.
    pub fn new(window: &Window, id: ThreadId, layout: ThreadLayout) -> Rc<Self> {
        let layout = Rc::new(layout);
        let shared = Rc::new(ThreadShared {
            window: window.clone(),
            layout: Rc::clone(&layout),
            index: Rc::new(RefCell::new(IndexMap::new())),
            on_comment_added: EventChannel::new(),
        });

        let root = {
            let doc = window.document();
            doc.elements_by_classes(doc.root(), &layout.root_classes())
                .first()
                .copied()
        };
        let Some(root) = root else {
            log::debug!("thread {id}: no root listing, staying inert");
            return Rc::new(Self {
                id,
                root: None,
                shared,
                observer: None,
                disposed: Cell::new(false),
            });
        };

        log::debug!("thread {id} opened");
        let observer = window.observe(root, ObserveOptions::child_list_subtree());
        let weak: Weak<ThreadShared> = Rc::downgrade(&shared);
        observer.subscribe(move |batch: &MutationBatch| {
            if let Some(shared) = weak.upgrade() {
                shared.on_mutations(batch);
            }
        });

        Rc::new(Self {
            id,
            root: Some(root),
            shared,
            observer: Some(observer),
            disposed: Cell::new(false),
        })
    }

    /// [`CommentThread::new`] followed by the initial [`scan`](Self::scan).
    pub fn open(window: &Window, id: ThreadId, layout: ThreadLayout) -> Rc<Self> {
        let thread = Self::new(window, id, layout);
        thread.scan();
        thread
    }

    /// Register every comment currently under the root listing and announce
    /// the new ones, replies before the comment they answer.
    ///
    /// Returns the number of newly registered comments. Calling it again only
    /// picks up comments that are not yet known.
    pub fn scan(&self) -> usize {
        let Some(root) = self.root.filter(|_| !self.disposed.get()) else {
            return 0;
        };
        let candidates = {
            let doc = self.shared.window.document();
            doc.elements_by_class(root, &self.shared.layout.comment_class)
        };
        let fresh = self.shared.register(candidates);
        log::debug!("thread {}: initial scan found {} comment(s)", self.id, fresh.len());
        self.shared.announce(&fresh);
        fresh.len()
    }

    pub fn id(&self) -> &ThreadId {
        &self.id
    }

    /// The root listing element, if the page has one.
    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    pub fn layout(&self) -> &ThreadLayout {
        &self.shared.layout
    }

    pub fn is_active(&self) -> bool {
        self.root.is_some() && !self.disposed.get()
    }

    pub fn comment_by_id(&self, id: &str) -> Option<Rc<CommentNode>> {
        self.shared.index.borrow().get(id).cloned()
    }

    /// Every known comment, in discovery order.
    pub fn all_comments(&self) -> Vec<Rc<CommentNode>> {
        self.shared.index.borrow().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.shared.index.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fires once per newly discovered comment.
    pub fn on_comment_added(&self) -> &EventChannel<Rc<CommentNode>> {
        &self.shared.on_comment_added
    }

    /// Stop observing and dispose every comment. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(observer) = &self.observer {
            observer.disconnect();
        }
        self.shared.on_comment_added.dispose();
        let drained: Vec<_> = self.shared.index.borrow_mut().drain(..).collect();
        for (_, comment) in &drained {
            comment.dispose();
        }
        log::debug!("thread {} disposed ({} comment(s))", self.id, drained.len());
    }
}

impl Drop for CommentThread {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl ThreadShared {
    fn on_mutations(&self, batch: &MutationBatch) {
        let candidates = {
            let doc = self.window.document();
            let comment_class = self.layout.comment_class.as_str();
            let mut candidates = Vec::new();
            for record in batch.iter() {
                let MutationRecord::ChildList { target, added, .. } = record else {
                    continue;
                };
                if !doc.has_class(*target, &self.layout.container_class) {
                    continue;
                }
                for &key in added.iter().filter(|k| doc.is_element(**k)) {
                    if doc.has_class(key, comment_class) {
                        candidates.push(key);
                    }
                    candidates.extend(doc.elements_by_class(key, comment_class));
                }
            }
            candidates
        };
        if candidates.is_empty() {
            return;
        }
        let fresh = self.register(candidates);
        log::trace!("mutation batch added {} comment(s)", fresh.len());
        self.announce(&fresh);
    }

    /// Wrap and index every candidate that is attached, carries an identity
    /// and is not known yet. Returns the new nodes in candidate order.
    fn register(&self, candidates: Vec<NodeKey>) -> Vec<Rc<CommentNode>> {
        let mut fresh = Vec::new();
        for key in candidates {
            let id = {
                let doc = self.window.document();
                if !doc.is_connected(key) {
                    log::debug!("comment element {key:?} detached before registration, skipped");
                    continue;
                }
                match read_identity(&doc, key, &self.layout) {
                    Ok(id) => id,
                    Err(err) => {
                        log::warn!("skipping comment element: {err}");
                        continue;
                    }
                }
            };
            if self.index.borrow().contains_key(&id) {
                log::debug!("comment {id} already known, ignored");
                continue;
            }
            match CommentNode::new(&self.window, key, &self.layout, &self.index) {
                Ok(node) => {
                    self.index.borrow_mut().insert(id, Rc::clone(&node));
                    fresh.push(node);
                }
                Err(err) => log::warn!("skipping comment element: {err}"),
            }
        }
        fresh
    }

    /// Fire `on_comment_added` for `fresh`, replies before their parent.
    fn announce(&self, fresh: &[Rc<CommentNode>]) {
        let mut pending: HashSet<CommentId> = fresh.iter().map(|c| c.id().clone()).collect();
        let mut order = Vec::with_capacity(fresh.len());
        for start in fresh {
            if !pending.contains(start.id()) {
                continue;
            }
            let mut stack = vec![(Rc::clone(start), false)];
            while let Some((comment, expanded)) = stack.pop() {
                if expanded {
                    if pending.remove(comment.id()) {
                        order.push(comment);
                    }
                    continue;
                }
                let replies = comment.child_comments();
                stack.push((comment, true));
                stack.extend(replies.into_iter().rev().map(|reply| (reply, false)));
            }
        }
        for comment in order {
            self.on_comment_added.dispatch(&comment);
        }
    }
}
