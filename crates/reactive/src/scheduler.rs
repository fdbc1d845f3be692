//! Host event-loop hook.
//!
//! The scope never blocks or spawns. When it wants a digest on a later turn
//! it hands a task to a `Scheduler`, which the host implements on top of its
//! own loop (a timer, a microtask queue, a frame callback).

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use core::cell::RefCell;
use core::mem;

/// A callback to run on a later turn.
pub type Task = Box<dyn FnOnce()>;

/// Runs tasks after the current synchronous execution has finished.
///
/// Implementations must never run `task` from inside `schedule_on_next_turn`.
pub trait Scheduler {
    fn schedule_on_next_turn(&self, task: Task);
}

/// A scheduler driven by hand.
///
/// Tasks accumulate until `run_pending` is called. Each call is one "turn":
/// tasks scheduled while a turn runs wait for the next call.
#[derive(Default)]
pub struct ManualScheduler {
    pending: RefCell<VecDeque<Task>>,
}

impl ManualScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tasks waiting for the next turn.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Returns true if no task is waiting.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Runs one turn and returns how many tasks ran.
    pub fn run_pending(&self) -> usize {
        let batch = mem::take(&mut *self.pending.borrow_mut());
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }

    /// Runs turns until nothing is pending or `max_turns` is reached.
    ///
    /// Returns the total number of tasks that ran.
    pub fn run_until_idle(&self, max_turns: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_turns {
            if self.is_idle() {
                break;
            }
            total += self.run_pending();
        }
        total
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_on_next_turn(&self, task: Task) {
        self.pending.borrow_mut().push_back(task);
    }
}

impl core::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;

    #[test]
    fn test_tasks_wait_for_turn() {
        let scheduler = ManualScheduler::new();
        let ran = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let ran = ran.clone();
            scheduler.schedule_on_next_turn(Box::new(move || ran.borrow_mut().push(i)));
        }

        assert!(ran.borrow().is_empty());
        assert_eq!(scheduler.pending(), 3);

        assert_eq!(scheduler.run_pending(), 3);
        assert_eq!(*ran.borrow(), alloc::vec![0, 1, 2]);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_rescheduled_task_runs_next_turn() {
        let scheduler = Rc::new(ManualScheduler::new());
        let count = Rc::new(RefCell::new(0));

        let inner_scheduler = scheduler.clone();
        let inner_count = count.clone();
        scheduler.schedule_on_next_turn(Box::new(move || {
            *inner_count.borrow_mut() += 1;
            let again = inner_count.clone();
            inner_scheduler.schedule_on_next_turn(Box::new(move || *again.borrow_mut() += 10));
        }));

        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.run_until_idle(5), 1);
        assert_eq!(*count.borrow(), 11);
    }
}
