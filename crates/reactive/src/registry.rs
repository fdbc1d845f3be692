//! Ordered watcher registry.
//!
//! Watchers are kept in registration order, which is also the evaluation
//! order of a digest pass. A pass iterates over a snapshot of the list, so
//! callbacks may register or deregister watchers while it runs.

use crate::watcher::{ListenerFn, WatchFn, Watcher, WatcherId};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;

/// Watchers of one scope plus the short-circuit marker of the digest loop.
pub struct WatcherRegistry {
    /// Registered watchers in registration order
    watchers: Vec<Rc<Watcher>>,
    /// Next watcher ID to assign
    next_id: WatcherId,
    /// Most recently dirtied watcher; never owns it
    last_dirty: Option<Weak<Watcher>>,
    /// Set when a watcher is registered, cleared at the start of each pass
    added_since_pass: bool,
}

impl Default for WatcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WatcherRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            watchers: Vec::new(),
            next_id: 1,
            last_dirty: None,
            added_since_pass: false,
        }
    }

    /// Appends a watcher and returns it.
    ///
    /// A new watcher has never been evaluated, so the short-circuit marker is
    /// cleared to keep the next pass from stopping before it.
    pub fn push(&mut self, watch_fn: WatchFn, listener_fn: ListenerFn, value_eq: bool) -> Rc<Watcher> {
        let id = self.next_id;
        self.next_id += 1;

        let watcher = Rc::new(Watcher::new(id, watch_fn, listener_fn, value_eq));
        self.watchers.push(watcher.clone());
        self.last_dirty = None;
        self.added_since_pass = true;
        watcher
    }

    /// Removes this exact watcher instance.
    ///
    /// Returns true if it was registered.
    pub fn remove(&mut self, watcher: &Rc<Watcher>) -> bool {
        let Some(position) = self.watchers.iter().position(|w| Rc::ptr_eq(w, watcher)) else {
            return false;
        };
        self.watchers.remove(position);
        watcher.retire();
        self.last_dirty = None;
        true
    }

    /// Returns the watchers to evaluate in the next pass.
    pub fn begin_pass(&mut self) -> Vec<Rc<Watcher>> {
        self.added_since_pass = false;
        self.watchers.clone()
    }

    /// Returns whether a watcher was registered since the pass began.
    #[inline]
    pub fn added_since_pass(&self) -> bool {
        self.added_since_pass
    }

    /// Records `watcher` as the most recently dirtied one.
    pub fn mark_dirty(&mut self, watcher: &Rc<Watcher>) {
        self.last_dirty = Some(Rc::downgrade(watcher));
    }

    /// Returns true if `watcher` is the most recently dirtied one.
    pub fn is_last_dirty(&self, watcher: &Rc<Watcher>) -> bool {
        self.last_dirty
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|w| Rc::ptr_eq(&w, watcher))
            .unwrap_or(false)
    }

    /// Forgets the short-circuit marker.
    #[inline]
    pub fn clear_last_dirty(&mut self) {
        self.last_dirty = None;
    }

    /// Returns the number of registered watchers.
    #[inline]
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    /// Returns true if there are no watchers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Returns all watcher IDs in registration order.
    pub fn watcher_ids(&self) -> Vec<WatcherId> {
        self.watchers.iter().map(|w| w.id()).collect()
    }
}
