use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Handle returned by `subscribe`/`once`, used to unsubscribe later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Returned when a subscription was not registered (disposed or inactive channel,
    /// or a `once` satisfied by replay). Unsubscribing it is a no-op.
    pub const INERT: ListenerId = ListenerId(0);

    pub fn is_inert(self) -> bool {
        self == Self::INERT
    }
}

/// Anything listeners can be attached to.
pub trait Subscribable<T> {
    /// Register `listener` for every future dispatch.
    fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + 'static;

    /// Register `listener` for the next dispatch only.
    fn once<F>(&self, listener: F) -> ListenerId
    where
        F: FnOnce(&T) + 'static;

    /// Returns `false` if `id` was not subscribed.
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

type Listener<T> = Rc<dyn Fn(&T)>;

struct Slot<T> {
    id: ListenerId,
    once: bool,
    listener: Listener<T>,
}

struct ChannelState<T> {
    slots: Vec<Slot<T>>,
    next_id: u64,
    disposed: bool,
}

/// Typed synchronous event channel.
///
/// Cloning yields another handle to the same channel.
pub struct EventChannel<T> {
    state: Rc<RefCell<ChannelState<T>>>,
}

impl<T> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ChannelState {
                slots: Vec::new(),
                next_id: 1,
                disposed: false,
            })),
        }
    }

    /// Invoke every current listener with `value`. Returns the number of
    /// listeners that were invoked.
    pub fn dispatch(&self, value: &T) -> usize {
        let snapshot: Vec<(ListenerId, Listener<T>)> = {
            let state = self.state.borrow();
            if state.disposed {
                log::debug!("dispatch on disposed channel ignored");
                return 0;
            }
            state
                .slots
                .iter()
                .map(|slot| (slot.id, Rc::clone(&slot.listener)))
                .collect()
        };

        let mut delivered = 0;
        for (id, listener) in snapshot {
            let live = {
                let mut state = self.state.borrow_mut();
                if state.disposed {
                    break;
                }
                match state.slots.iter().position(|slot| slot.id == id) {
                    Some(index) => {
                        if state.slots[index].once {
                            state.slots.remove(index);
                        }
                        true
                    }
                    None => false,
                }
            };
            if !live {
                continue;
            }
            listener(value);
            delivered += 1;
        }
        delivered
    }

    /// Detach every listener. Later subscriptions and dispatches are inert.
    pub fn dispose(&self) {
        let dropped = {
            let mut state = self.state.borrow_mut();
            state.disposed = true;
            std::mem::take(&mut state.slots)
        };
        log::trace!("channel disposed, {} listener(s) detached", dropped.len());
        // Listeners drop here, after the borrow is released.
        drop(dropped);
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    pub fn len(&self) -> usize {
        self.state.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register(&self, once: bool, listener: Listener<T>) -> ListenerId {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            log::debug!("subscribe on disposed channel ignored");
            return ListenerId::INERT;
        }
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.slots.push(Slot { id, once, listener });
        id
    }
}

impl<T: 'static> Subscribable<T> for EventChannel<T> {
    fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        self.register(false, Rc::new(listener))
    }

    fn once<F>(&self, listener: F) -> ListenerId
    where
        F: FnOnce(&T) + 'static,
    {
        let cell = RefCell::new(Some(listener));
        self.register(
            true,
            Rc::new(move |value: &T| {
                let taken = cell.borrow_mut().take();
                if let Some(listener) = taken {
                    listener(value);
                }
            }),
        )
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        if id.is_inert() {
            return false;
        }
        let removed = {
            let mut state = self.state.borrow_mut();
            let index = state.slots.iter().position(|slot| slot.id == id);
            index.map(|index| state.slots.remove(index))
        };
        removed.is_some()
    }
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventChannel")
            .field("listeners", &state.slots.len())
            .field("disposed", &state.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&i32)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let make = {
            let log = Rc::clone(&log);
            move |name: &str| -> Box<dyn Fn(&i32)> {
                let log = Rc::clone(&log);
                let name = name.to_string();
                Box::new(move |v: &i32| log.borrow_mut().push(format!("{name}:{v}")))
            }
        };
        (log, make)
    }

    #[test]
    fn dispatches_in_subscription_order() {
        let channel: EventChannel<i32> = EventChannel::new();
        let (log, make) = recorder();
        channel.subscribe(make("a"));
        channel.subscribe(make("b"));
        channel.subscribe(make("c"));

        assert_eq!(channel.dispatch(&1), 3);
        assert_eq!(*log.borrow(), vec!["a:1", "b:1", "c:1"]);
    }

    #[test]
    fn once_fires_a_single_time() {
        let channel: EventChannel<i32> = EventChannel::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        channel.once(move |_: &i32| h.set(h.get() + 1));

        channel.dispatch(&1);
        channel.dispatch(&2);

        assert_eq!(hits.get(), 1);
        assert!(channel.is_empty());
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let channel: EventChannel<i32> = EventChannel::new();
        let (log, make) = recorder();
        let a = channel.subscribe(make("a"));
        channel.subscribe(make("b"));

        assert!(channel.unsubscribe(a));
        assert!(!channel.unsubscribe(a));
        channel.dispatch(&7);

        assert_eq!(*log.borrow(), vec!["b:7"]);
    }

    #[test]
    fn listener_added_during_dispatch_misses_in_flight_value() {
        let channel: EventChannel<i32> = EventChannel::new();
        let late_hits = Rc::new(RefCell::new(Vec::new()));
        let inner = channel.clone();
        let hits = Rc::clone(&late_hits);
        channel.once(move |_| {
            let hits = Rc::clone(&hits);
            inner.subscribe(move |v| hits.borrow_mut().push(*v));
        });

        channel.dispatch(&1);
        channel.dispatch(&2);

        assert_eq!(*late_hits.borrow(), vec![2]);
    }

    #[test]
    fn listener_removed_during_dispatch_is_skipped() {
        let channel: EventChannel<i32> = EventChannel::new();
        let (log, make) = recorder();
        let victim = Rc::new(Cell::new(ListenerId::INERT));
        let inner = channel.clone();
        let v = Rc::clone(&victim);
        channel.subscribe(move |_| {
            inner.unsubscribe(v.get());
        });
        victim.set(channel.subscribe(make("victim")));

        assert_eq!(channel.dispatch(&3), 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn re_entrant_once_does_not_double_fire() {
        let channel: EventChannel<i32> = EventChannel::new();
        let hits = Rc::new(Cell::new(0));
        let inner = channel.clone();
        let h = Rc::clone(&hits);
        channel.once(move |v| {
            h.set(h.get() + 1);
            if *v == 0 {
                inner.dispatch(&1);
            }
        });

        channel.dispatch(&0);

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn disposed_channel_is_inert() {
        let channel: EventChannel<i32> = EventChannel::new();
        let (log, make) = recorder();
        channel.subscribe(make("a"));
        channel.dispose();

        assert!(channel.is_disposed());
        assert_eq!(channel.dispatch(&1), 0);
        assert_eq!(channel.subscribe(make("b")), ListenerId::INERT);
        assert_eq!(channel.dispatch(&2), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn dispose_during_dispatch_stops_delivery() {
        let channel: EventChannel<i32> = EventChannel::new();
        let (log, make) = recorder();
        let inner = channel.clone();
        channel.subscribe(move |_| inner.dispose());
        channel.subscribe(make("after"));

        assert_eq!(channel.dispatch(&1), 1);
        assert!(log.borrow().is_empty());
    }
}
