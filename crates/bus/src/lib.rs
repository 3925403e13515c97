//! Process-local, single-threaded publish/subscribe primitives.
//!
//! Every component that needs decoupled notification (node added, thread
//! opened, element clicked, mutation batches) goes through an
//! [`EventChannel`]. [`ReplayChannel`] is the hot-replay flavour that hands its
//! last value to late subscribers.
//!
//! Invariants:
//! - `dispatch` invokes the listeners subscribed when the dispatch started, in
//!   subscription order. Listeners added during a dispatch do not see it.
//! - A listener removed during a dispatch (by `unsubscribe`, `dispose`, or a
//!   `once` firing) is not invoked for the rest of that dispatch.
//! - Nothing is held borrowed while a listener runs, so listeners may freely
//!   subscribe, unsubscribe, dispatch or dispose re-entrantly.
//! - After `dispose`, subscribing is an inert no-op returning
//!   [`ListenerId::INERT`] and dispatching delivers nothing.

mod channel;
mod replay;

pub use crate::channel::{EventChannel, ListenerId, Subscribable};
pub use crate::replay::ReplayChannel;
