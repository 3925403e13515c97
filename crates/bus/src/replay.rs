use crate::channel::{EventChannel, ListenerId, Subscribable};
use std::cell::RefCell;
use std::rc::Rc;

/// Hot-replay channel: remembers the last dispatched value and hands it to
/// new subscribers synchronously, in addition to future dispatches.
///
/// A channel built with [`ReplayChannel::inert`] never records, never
/// delivers and never replays.
pub struct ReplayChannel<T: Clone> {
    channel: EventChannel<T>,
    last: Rc<RefCell<Option<T>>>,
    active: bool,
}

impl<T: Clone + 'static> ReplayChannel<T> {
    pub fn new() -> Self {
        Self {
            channel: EventChannel::new(),
            last: Rc::new(RefCell::new(None)),
            active: true,
        }
    }

    pub fn inert() -> Self {
        Self {
            active: false,
            ..Self::new()
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn dispatch(&self, value: T) -> usize {
        if !self.active {
            log::debug!("dispatch on inert replay channel ignored");
            return 0;
        }
        if self.channel.is_disposed() {
            log::debug!("dispatch on disposed replay channel ignored");
            return 0;
        }
        *self.last.borrow_mut() = Some(value.clone());
        self.channel.dispatch(&value)
    }

    pub fn current(&self) -> Option<T> {
        self.last.borrow().clone()
    }

    pub fn dispose(&self) {
        self.channel.dispose();
        self.last.borrow_mut().take();
    }
}

impl<T: Clone + 'static> Subscribable<T> for ReplayChannel<T> {
    fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        if !self.active {
            return ListenerId::INERT;
        }
        let listener = Rc::new(listener);
        let forward = Rc::clone(&listener);
        let id = self.channel.subscribe(move |value: &T| forward(value));
        if id.is_inert() {
            return id;
        }
        if let Some(value) = self.current() {
            listener(&value);
        }
        id
    }

    fn once<F>(&self, listener: F) -> ListenerId
    where
        F: FnOnce(&T) + 'static,
    {
        if !self.active || self.channel.is_disposed() {
            return ListenerId::INERT;
        }
        match self.current() {
            Some(value) => {
                listener(&value);
                ListenerId::INERT
            }
            None => self.channel.once(listener),
        }
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.channel.unsubscribe(id)
    }
}

impl<T: Clone + 'static> Default for ReplayChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}
