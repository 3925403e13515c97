use crate::page_mode;
use crate::thread::CommentThread;
use bus::{ListenerId, ReplayChannel, Subscribable};
use platform::Window;
use std::rc::Rc;

/// Announces the thread opened on the current page.
///
/// Late subscribers receive the open thread immediately, so subscribing is
/// never too late. Off single-thread views the notifier is inert: nothing is
/// ever delivered and [`open`](Self::open) is ignored.
pub struct ThreadOpenNotifier {
    channel: ReplayChannel<Rc<CommentThread>>,
}

impl ThreadOpenNotifier {
    pub fn new(active: bool) -> Self {
        let channel = if active {
            ReplayChannel::new()
        } else {
            ReplayChannel::inert()
        };
        Self { channel }
    }

    /// Active exactly when `window` shows a single discussion.
    pub fn for_window(window: &Window) -> Self {
        Self::new(page_mode::is_single_thread_view(window.location()))
    }

    pub fn is_active(&self) -> bool {
        self.channel.is_active()
    }

    /// Move to the thread-open state. Returns the number of listeners reached.
    pub fn open(&self, thread: Rc<CommentThread>) -> usize {
        if self.channel.current().is_some() {
            log::warn!("thread {} already open, ignoring {}", self.describe_current(), thread.id());
            return 0;
        }
        log::debug!("announcing thread {}", thread.id());
        self.channel.dispatch(thread)
    }

    pub fn current(&self) -> Option<Rc<CommentThread>> {
        self.channel.current()
    }

    pub fn dispose(&self) {
        self.channel.dispose();
    }

    fn describe_current(&self) -> String {
        self.current()
            .map(|t| t.id().to_string())
            .unwrap_or_default()
    }
}

impl Subscribable<Rc<CommentThread>> for ThreadOpenNotifier {
    fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Rc<CommentThread>) + 'static,
    {
        self.channel.subscribe(listener)
    }

    fn once<F>(&self, listener: F) -> ListenerId
    where
        F: FnOnce(&Rc<CommentThread>) + 'static,
    {
        self.channel.once(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.channel.unsubscribe(id)
    }
}
