//! Deterministic monotonic timer queue.
//!
//! Time only moves when the owner calls [`TimerQueue::advance`]; a host loop
//! maps wall-clock time onto it, tests drive it with simulated milliseconds.
//! Tasks run on the caller's thread, one at a time, in deadline order (ties in
//! scheduling order). Nothing is borrowed while a task runs, so tasks may
//! schedule or cancel other tasks.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

type Task = Box<dyn FnOnce()>;

struct QueueState {
    now: Duration,
    next_id: u64,
    deadlines: BinaryHeap<Reverse<(Duration, TimerId)>>,
    tasks: HashMap<TimerId, Task>,
}

/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct TimerQueue {
    state: Rc<RefCell<QueueState>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(QueueState {
                now: Duration::ZERO,
                next_id: 1,
                deadlines: BinaryHeap::new(),
                tasks: HashMap::new(),
            })),
        }
    }

    /// Time elapsed since the queue was created.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Run `task` once `delay` has elapsed.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        let deadline = state.now + delay;
        state.deadlines.push(Reverse((deadline, id)));
        state.tasks.insert(id, Box::new(task));
        log::trace!("timer {id:?} scheduled for {deadline:?}");
        id
    }

    /// Returns `false` if the timer already ran or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        self.state.borrow_mut().tasks.remove(&id).is_some()
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    /// Deadline of the earliest live timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        let mut state = self.state.borrow_mut();
        loop {
            let Reverse((deadline, id)) = *state.deadlines.peek()?;
            if state.tasks.contains_key(&id) {
                return Some(deadline);
            }
            state.deadlines.pop();
        }
    }

    /// Move time forward by `by`, running every task whose deadline falls
    /// inside the window (including tasks scheduled by those tasks). Returns
    /// the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;
        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
        }
        self.state.borrow_mut().now = target;
        ran
    }

    /// Run every pending task, advancing time to the last deadline.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(deadline) = self.next_deadline() {
            let by = deadline.saturating_sub(self.now());
            ran += self.advance(by);
        }
        ran
    }

    fn pop_due(&self, target: Duration) -> Option<Task> {
        let mut state = self.state.borrow_mut();
        loop {
            let Reverse((deadline, id)) = *state.deadlines.peek()?;
            if deadline > target {
                return None;
            }
            state.deadlines.pop();
            if let Some(task) = state.tasks.remove(&id) {
                state.now = deadline;
                return Some(task);
            }
        }
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn task_runs_at_deadline_not_before() {
        let timers = TimerQueue::new();
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        timers.schedule(ms(2500), move || f.set(true));

        assert_eq!(timers.advance(ms(2499)), 0);
        assert!(!fired.get());
        assert_eq!(timers.advance(ms(1)), 1);
        assert!(fired.get());
        assert_eq!(timers.now(), ms(2500));
    }

    #[test]
    fn tasks_run_in_deadline_then_schedule_order() {
        let timers = TimerQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (delay, name) in [(30, "c"), (10, "a"), (10, "b")] {
            let o = Rc::clone(&order);
            timers.schedule(ms(delay), move || o.borrow_mut().push(name));
        }

        timers.advance(ms(100));

        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn task_sees_its_own_deadline_as_now() {
        let timers = TimerQueue::new();
        let seen = Rc::new(Cell::new(Duration::ZERO));
        let (s, t) = (Rc::clone(&seen), timers.clone());
        timers.schedule(ms(40), move || s.set(t.now()));

        timers.advance(ms(100));

        assert_eq!(seen.get(), ms(40));
        assert_eq!(timers.now(), ms(100));
    }

    #[test]
    fn nested_schedule_inside_window_runs() {
        let timers = TimerQueue::new();
        let hits = Rc::new(Cell::new(0));
        let (h, t) = (Rc::clone(&hits), timers.clone());
        timers.schedule(ms(10), move || {
            let h = Rc::clone(&h);
            h.set(h.get() + 1);
            t.schedule(ms(10), move || h.set(h.get() + 1));
        });

        assert_eq!(timers.advance(ms(20)), 2);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn cancelled_task_never_runs() {
        let timers = TimerQueue::new();
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        let id = timers.schedule(ms(5), move || f.set(true));

        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert_eq!(timers.next_deadline(), None);
        assert_eq!(timers.run_until_idle(), 0);
        assert!(!fired.get());
    }

    #[test]
    fn run_until_idle_drains_everything() {
        let timers = TimerQueue::new();
        let hits = Rc::new(Cell::new(0));
        for delay in [5, 500, 2500] {
            let h = Rc::clone(&hits);
            timers.schedule(ms(delay), move || h.set(h.get() + 1));
        }

        assert_eq!(timers.run_until_idle(), 3);
        assert_eq!(timers.pending(), 0);
        assert_eq!(timers.now(), ms(2500));
    }
}
