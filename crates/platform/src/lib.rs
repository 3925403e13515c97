//! Single-threaded host for one page: the document, its address, timers,
//! mutation observers and click dispatch.
//!
//! Everything runs to completion on the calling thread. Mutation records are
//! queued by the document as changes happen and delivered in batches at
//! checkpoints (after a click dispatch, after timers run, or on an explicit
//! [`Window::deliver_mutations`]).

use bus::{EventChannel, Subscribable};
use dom::{Document, DomPatch, DomPatchError, MutationRecord, NodeKey, ObserveOptions, ObserverId};
use runtime_timer::TimerQueue;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};
use url::Url;

/// Guard against observers that keep mutating what they observe.
const MAX_DELIVERY_ROUNDS: usize = 64;

pub type MutationBatch = Rc<[MutationRecord]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: NodeKey,
}

struct WindowInner {
    document: RefCell<Document>,
    location: Url,
    timers: TimerQueue,
    clicks: EventChannel<ClickEvent>,
    observers: RefCell<HashMap<ObserverId, EventChannel<MutationBatch>>>,
}

/// Cloning yields another handle to the same window.
#[derive(Clone)]
pub struct Window {
    inner: Rc<WindowInner>,
}

impl Window {
    pub fn new(location: Url, document: Document) -> Self {
        Self {
            inner: Rc::new(WindowInner {
                document: RefCell::new(document),
                location,
                timers: TimerQueue::new(),
                clicks: EventChannel::new(),
                observers: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakWindow {
        WeakWindow(Rc::downgrade(&self.inner))
    }

    pub fn location(&self) -> &Url {
        &self.inner.location
    }

    /// Borrow the document. Do not hold the guard across calls that dispatch
    /// events (`click`, `advance`, `deliver_mutations`).
    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.document.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.document.borrow_mut()
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.inner.timers
    }

    pub fn clicks(&self) -> &EventChannel<ClickEvent> {
        &self.inner.clicks
    }

    pub fn apply(&self, patches: &[DomPatch]) -> Result<(), DomPatchError> {
        self.document_mut().apply(patches)
    }

    /// Start observing `target`. Records are queued from this point on and
    /// delivered to [`MutationObserver::records`] at the next checkpoint.
    pub fn observe(&self, target: NodeKey, options: ObserveOptions) -> MutationObserver {
        let id = self.document_mut().observe(target, options);
        let records = EventChannel::new();
        self.inner
            .observers
            .borrow_mut()
            .insert(id, records.clone());
        MutationObserver {
            window: Rc::downgrade(&self.inner),
            id,
            records,
        }
    }

    /// Hand queued mutation records to their observers. Returns the number of
    /// batches delivered.
    pub fn deliver_mutations(&self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_DELIVERY_ROUNDS {
            let batches = self.document_mut().take_records();
            if batches.is_empty() {
                return delivered;
            }
            for (id, records) in batches {
                let channel = self.inner.observers.borrow().get(&id).cloned();
                let Some(channel) = channel else {
                    continue;
                };
                log::trace!("delivering {} record(s) to {id:?}", records.len());
                channel.dispatch(&Rc::from(records));
                delivered += 1;
            }
        }
        log::warn!("mutation delivery did not settle after {MAX_DELIVERY_ROUNDS} rounds");
        delivered
    }

    /// Dispatch a click on `target` to every click listener, then deliver
    /// any mutations the listeners caused.
    pub fn click(&self, target: NodeKey) -> usize {
        let listeners = self.inner.clicks.dispatch(&ClickEvent { target });
        self.deliver_mutations();
        listeners
    }

    /// Let `by` of simulated time pass. Returns the number of timers that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let ran = self.inner.timers.advance(by);
        self.deliver_mutations();
        ran
    }

    pub fn run_until_idle(&self) -> usize {
        let ran = self.inner.timers.run_until_idle();
        self.deliver_mutations();
        ran
    }

    /// Drive the timers from the wall clock until none are pending, waking at
    /// most every `frame`.
    pub fn run(&self, frame: Duration) {
        self.deliver_mutations();
        let mut last = Instant::now();
        while let Some(deadline) = self.inner.timers.next_deadline() {
            let wait = deadline.saturating_sub(self.inner.timers.now()).min(frame);
            std::thread::sleep(wait);
            let now = Instant::now();
            self.advance(now - last);
            last = now;
        }
    }
}

/// Non-owning window handle for listeners registered on the window itself.
#[derive(Clone)]
pub struct WeakWindow(Weak<WindowInner>);

impl WeakWindow {
    pub fn upgrade(&self) -> Option<Window> {
        self.0.upgrade().map(|inner| Window { inner })
    }
}

/// Live registration created by [`Window::observe`].
pub struct MutationObserver {
    window: Weak<WindowInner>,
    id: ObserverId,
    records: EventChannel<MutationBatch>,
}

impl MutationObserver {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn records(&self) -> &EventChannel<MutationBatch> {
        &self.records
    }

    /// Stop observing; queued but undelivered records are dropped. Returns
    /// `false` if already disconnected.
    pub fn disconnect(&self) -> bool {
        self.records.dispose();
        let Some(inner) = self.window.upgrade() else {
            return false;
        };
        let removed = inner.observers.borrow_mut().remove(&self.id).is_some();
        inner.document.borrow_mut().disconnect(self.id);
        removed
    }
}

impl Subscribable<MutationBatch> for MutationObserver {
    fn subscribe<F>(&self, listener: F) -> bus::ListenerId
    where
        F: Fn(&MutationBatch) + 'static,
    {
        self.records.subscribe(listener)
    }

    fn once<F>(&self, listener: F) -> bus::ListenerId
    where
        F: FnOnce(&MutationBatch) + 'static,
    {
        self.records.once(listener)
    }

    fn unsubscribe(&self, id: bus::ListenerId) -> bool {
        self.records.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::ElementSpec;
    use std::cell::Cell;

    fn window() -> Window {
        let url = Url::parse("https://old.reddit.com/r/rust/comments/abc123/title/").unwrap();
        Window::new(url, Document::new())
    }

    #[test]
    fn records_are_delivered_at_checkpoint() {
        let win = window();
        let body = win.document().body().unwrap();
        let observer = win.observe(body, ObserveOptions::child_list_subtree());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        observer.subscribe(move |batch: &MutationBatch| s.borrow_mut().extend(batch.iter().cloned()));

        let (key, patches) = win.document_mut().patches_for(body, &ElementSpec::new("div"));
        win.apply(&patches).unwrap();
        assert!(seen.borrow().is_empty());

        assert_eq!(win.deliver_mutations(), 1);
        assert_eq!(
            *seen.borrow(),
            vec![MutationRecord::ChildList {
                target: body,
                added: vec![key],
                removed: Vec::new(),
            }]
        );
    }

    #[test]
    fn insertion_before_first_delivery_is_not_missed() {
        let win = window();
        let body = win.document().body().unwrap();
        let observer = win.observe(body, ObserveOptions::child_list_subtree());

        // Mutate before anyone subscribes to the record channel.
        let (_, patches) = win.document_mut().patches_for(body, &ElementSpec::new("div"));
        win.apply(&patches).unwrap();

        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        observer.subscribe(move |_: &MutationBatch| h.set(h.get() + 1));
        win.deliver_mutations();

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn disconnected_observer_gets_nothing() {
        let win = window();
        let body = win.document().body().unwrap();
        let observer = win.observe(body, ObserveOptions::child_list_subtree());
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        observer.subscribe(move |_: &MutationBatch| h.set(h.get() + 1));

        assert!(observer.disconnect());
        assert!(!observer.disconnect());
        let (_, patches) = win.document_mut().patches_for(body, &ElementSpec::new("div"));
        win.apply(&patches).unwrap();

        assert_eq!(win.deliver_mutations(), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn timers_run_and_flush_mutations() {
        let win = window();
        let body = win.document().body().unwrap();
        let observer = win.observe(body, ObserveOptions::attributes_of(&["class"]));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        observer.subscribe(move |_: &MutationBatch| h.set(h.get() + 1));

        let w = win.clone();
        win.timers().schedule(Duration::from_millis(100), move || {
            let _ = w.document_mut().add_class(body, "late");
        });

        assert_eq!(win.advance(Duration::from_millis(99)), 0);
        assert_eq!(win.advance(Duration::from_millis(1)), 1);
        assert_eq!(hits.get(), 1);
        assert!(win.document().has_class(body, "late"));
    }

    #[test]
    fn click_reaches_listeners() {
        let win = window();
        let body = win.document().body().unwrap();
        let target = Rc::new(Cell::new(None));
        let t = Rc::clone(&target);
        win.clicks().subscribe(move |evt: &ClickEvent| t.set(Some(evt.target)));

        assert_eq!(win.click(body), 1);
        assert_eq!(target.get(), Some(body));
    }
}
