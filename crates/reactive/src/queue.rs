//! FIFO queues of deferred work.

use crate::scope::Scope;
use alloc::boxed::Box;
use alloc::collections::VecDeque;
use settle_core::CallbackError;

/// Expression queued by `eval_async` or `apply_async`.
pub type AsyncTask = Box<dyn FnOnce(&Scope) -> Result<(), CallbackError>>;

/// Callback queued by `post_digest`.
pub type PostDigestTask = Box<dyn FnOnce(&Scope) -> Result<(), CallbackError>>;

/// An ordered queue of tasks.
pub(crate) struct TaskQueue<T> {
    tasks: VecDeque<T>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, task: T) {
        self.tasks.push_back(task);
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Option<T> {
        self.tasks.pop_front()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
