//! Grouped watchers sharing one listener.
//!
//! `watch_group` registers one internal watcher per watch function plus a
//! trailing flush watcher. The entry watchers record what changed during the
//! pass; the flush watcher sees the change counter move and calls the group
//! listener once with freshly built `current` and `previous` sequences.
//! Nothing is carried over between passes except each entry's latest value.

use crate::equality::Observed;
use crate::scope::Scope;
use crate::watcher::{Deregister, WatchFn};
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use settle_core::{CallbackError, Value};

/// Per-group bookkeeping between the entry watchers and the flush watcher.
struct GroupState {
    /// Latest observed value of each entry
    latest: Vec<Observed>,
    /// Value each entry had before it changed in the current pass
    previous: Vec<Option<Value>>,
    /// Bumped on every entry change; watched by the flush watcher
    generation: i64,
    /// Set once the listener has been handed a snapshot
    reported: bool,
}

impl GroupState {
    fn new(len: usize) -> Self {
        Self {
            latest: (0..len).map(|_| Observed::Unset).collect(),
            previous: (0..len).map(|_| None).collect(),
            generation: 0,
            reported: false,
        }
    }

    fn record(&mut self, index: usize, current: &Value, previous: &Value) {
        if self.previous[index].is_none() {
            // An entry first observed after the listener ran was shown as Null.
            let shown = if self.reported && self.latest[index].is_unset() {
                Value::Null
            } else {
                previous.clone()
            };
            self.previous[index] = Some(shown);
        }
        self.latest[index] = Observed::Value(current.clone());
        self.generation += 1;
    }

    /// Builds the listener arguments for this pass and resets the per-pass
    /// record.
    fn take_snapshot(&mut self) -> (Vec<Value>, Vec<Value>) {
        self.reported = true;
        let current: Vec<Value> = self
            .latest
            .iter()
            .map(|o| o.value().cloned().unwrap_or(Value::Null))
            .collect();
        let previous = self
            .previous
            .iter_mut()
            .zip(current.iter())
            .map(|(p, c)| p.take().unwrap_or_else(|| c.clone()))
            .collect();
        (current, previous)
    }
}

/// Removes every watcher of a group.
#[derive(Debug)]
pub struct GroupDeregister {
    handles: Vec<Deregister>,
    cancelled: Rc<Cell<bool>>,
}

impl GroupDeregister {
    /// Returns true while any watcher of the group is registered, or while
    /// the one-shot call of an empty group is still pending.
    pub fn is_registered(&self) -> bool {
        if self.handles.is_empty() {
            return !self.cancelled.get();
        }
        self.handles.iter().any(Deregister::is_registered)
    }

    /// Removes the group. Returns true if anything was still registered.
    pub fn deregister(self) -> bool {
        let was_pending = !self.cancelled.replace(true);
        if self.handles.is_empty() {
            return was_pending;
        }
        self.handles
            .into_iter()
            .map(Deregister::deregister)
            .fold(false, |any, removed| any || removed)
    }
}

impl Scope {
    /// Watches several functions with one listener.
    ///
    /// On every pass in which at least one of `watch_fns` changed, the
    /// listener runs once with the current values and the previous values,
    /// both in the order of `watch_fns`. An entry seen for the first time
    /// reports its current value as previous. An entry whose watch function
    /// has not succeeded yet is reported as `Null`; once it succeeds, its
    /// previous value is that `Null`. An empty group calls the
    /// listener once, with two empty slices, during the next digest.
    pub fn watch_group<L>(&self, watch_fns: Vec<WatchFn>, mut listener_fn: L) -> GroupDeregister
    where
        L: FnMut(&[Value], &[Value], &Scope) -> Result<(), CallbackError> + 'static,
    {
        let cancelled = Rc::new(Cell::new(false));

        if watch_fns.is_empty() {
            let pending = cancelled.clone();
            self.eval_async(move |scope| {
                if pending.replace(true) {
                    return Ok(());
                }
                listener_fn(&[], &[], scope)
            });
            return GroupDeregister {
                handles: Vec::new(),
                cancelled,
            };
        }

        let state = Rc::new(RefCell::new(GroupState::new(watch_fns.len())));
        let mut handles = Vec::with_capacity(watch_fns.len() + 1);

        for (index, watch_fn) in watch_fns.into_iter().enumerate() {
            let state = state.clone();
            let record = move |current: &Value, previous: &Value, _: &Scope| -> Result<(), CallbackError> {
                state.borrow_mut().record(index, current, previous);
                Ok(())
            };
            handles.push(self.register(watch_fn, Box::new(record), false));
        }

        let counter = state.clone();
        handles.push(self.watch(
            move |_| Ok(Value::Int64(counter.borrow().generation)),
            move |_, _, scope| {
                let (current, previous) = state.borrow_mut().take_snapshot();
                listener_fn(&current, &previous, scope)
            },
            false,
        ));

        GroupDeregister { handles, cancelled }
    }
}
