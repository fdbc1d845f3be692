//! Watchers and their deregistration handles.
//!
//! A `Watcher` pairs a watch function with a listener and remembers what the
//! watch function returned the last time it counted as a change. Only the
//! digest loop updates that memory.

use crate::equality::{self, Observed};
use crate::registry::WatcherRegistry;
use crate::scope::Scope;
use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;
use core::mem;
use settle_core::{CallbackError, Value};

/// Unique identifier for a watcher.
pub type WatcherId = u64;

/// Computes the watched value.
pub type WatchFn = Box<dyn FnMut(&Scope) -> Result<Value, CallbackError>>;

/// Reacts to a change: `(new, old, scope)`.
pub type ListenerFn = Box<dyn FnMut(&Value, &Value, &Scope) -> Result<(), CallbackError>>;

/// Outcome of comparing a fresh evaluation with the retained observation.
pub(crate) enum Observation {
    Unchanged,
    Changed { current: Value, previous: Value },
}

/// A registered watch/listener pair.
pub struct Watcher {
    id: WatcherId,
    watch_fn: RefCell<WatchFn>,
    listener_fn: RefCell<ListenerFn>,
    value_eq: bool,
    last: RefCell<Observed>,
    registered: Cell<bool>,
}

impl Watcher {
    pub(crate) fn new(id: WatcherId, watch_fn: WatchFn, listener_fn: ListenerFn, value_eq: bool) -> Self {
        Self {
            id,
            watch_fn: RefCell::new(watch_fn),
            listener_fn: RefCell::new(listener_fn),
            value_eq,
            last: RefCell::new(Observed::Unset),
            registered: Cell::new(true),
        }
    }

    /// Returns the watcher ID.
    #[inline]
    pub fn id(&self) -> WatcherId {
        self.id
    }

    /// Returns true if this watcher compares structurally.
    #[inline]
    pub fn value_eq(&self) -> bool {
        self.value_eq
    }

    /// Returns false once the watcher has been deregistered.
    #[inline]
    pub fn is_registered(&self) -> bool {
        self.registered.get()
    }

    /// Returns a copy of the retained observation.
    pub fn last(&self) -> Observed {
        self.last.borrow().clone()
    }

    #[inline]
    pub(crate) fn retire(&self) {
        self.registered.set(false);
    }

    pub(crate) fn evaluate(&self, scope: &Scope) -> Result<Value, CallbackError> {
        let mut watch_fn = self.watch_fn.borrow_mut();
        (*watch_fn)(scope)
    }

    /// Compares `current` with the retained value and, on change, retains it.
    pub(crate) fn observe(&self, current: Value) -> Observation {
        let mut last = self.last.borrow_mut();
        if equality::are_equal(&current, &last, self.value_eq) {
            return Observation::Unchanged;
        }

        let retained = equality::retain(&current, self.value_eq);
        let previous = match mem::replace(&mut *last, Observed::Value(retained)) {
            Observed::Unset => current.clone(),
            Observed::Value(v) => v,
        };
        Observation::Changed { current, previous }
    }

    pub(crate) fn notify(&self, current: &Value, previous: &Value, scope: &Scope) -> Result<(), CallbackError> {
        let mut listener_fn = self.listener_fn.borrow_mut();
        (*listener_fn)(current, previous, scope)
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("value_eq", &self.value_eq)
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Removes exactly one watcher from its scope.
///
/// The handle points at the watcher instance, never at its functions, so a
/// second watcher built from identical closures is unaffected.
#[derive(Debug)]
pub struct Deregister {
    registry: Weak<RefCell<WatcherRegistry>>,
    watcher: Weak<Watcher>,
    id: WatcherId,
}

impl Deregister {
    pub(crate) fn new(registry: &Rc<RefCell<WatcherRegistry>>, watcher: &Rc<Watcher>) -> Self {
        Self {
            registry: Rc::downgrade(registry),
            watcher: Rc::downgrade(watcher),
            id: watcher.id(),
        }
    }

    /// Returns the ID of the watcher this handle removes.
    #[inline]
    pub fn id(&self) -> WatcherId {
        self.id
    }

    /// Returns true if the watcher is still registered.
    pub fn is_registered(&self) -> bool {
        self.watcher
            .upgrade()
            .map(|w| w.is_registered())
            .unwrap_or(false)
    }

    /// Removes the watcher.
    ///
    /// Returns true if it was still registered. Safe to call from inside a
    /// watch function or listener while a digest is running; the watcher is
    /// skipped for the rest of the pass.
    pub fn deregister(self) -> bool {
        let (Some(registry), Some(watcher)) = (self.registry.upgrade(), self.watcher.upgrade()) else {
            return false;
        };
        let removed = registry.borrow_mut().remove(&watcher);
        removed
    }
}
