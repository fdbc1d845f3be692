//! Scope and digest loop.
//!
//! This module provides `Scope`, the container of watchers, and the digest
//! loop that re-evaluates them until nothing changes.
//!
//! A digest runs passes over the registry. Each pass evaluates every watcher
//! in registration order and calls the listener of each one whose value
//! changed. After each pass the async queue is drained. The loop stops after
//! a pass that changed nothing and ran no queued expression, or fails with
//! `Error::UnstableDigest` once the configured TTL of passes is used up.
//!
//! # Example
//!
//! ```ignore
//! use settle_reactive::{ManualScheduler, Scope, Value};
//! use std::rc::Rc;
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let scope = Scope::new(scheduler.clone());
//!
//! scope.watch(
//!     |_| Ok(Value::Int64(42)),
//!     |new, old, _| {
//!         println!("{} -> {}", old, new);
//!         Ok(())
//!     },
//!     false,
//! );
//!
//! scope.digest()?;
//! ```

use crate::config::ScopeConfig;
use crate::phase::PhaseCell;
use crate::queue::{AsyncTask, PostDigestTask, TaskQueue};
use crate::registry::WatcherRegistry;
use crate::report::{ErrorHandler, TracingErrorHandler};
use crate::scheduler::Scheduler;
use crate::watcher::{Deregister, ListenerFn, Observation, WatchFn, WatcherId};
use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use settle_core::{CallbackError, Error, Phase, Result, Value};
use tracing::{debug, trace, warn};

/// State shared by every handle to one scope.
pub(crate) struct ScopeInner {
    config: ScopeConfig,
    registry: Rc<RefCell<WatcherRegistry>>,
    phase: PhaseCell,
    async_queue: RefCell<TaskQueue<AsyncTask>>,
    apply_async_queue: RefCell<TaskQueue<AsyncTask>>,
    apply_async_pending: Cell<bool>,
    post_digest_queue: RefCell<TaskQueue<PostDigestTask>>,
    scheduler: Rc<dyn Scheduler>,
    error_handler: Rc<dyn ErrorHandler>,
}

/// A container of watchers driven by the digest loop.
///
/// `Scope` is a cheap handle; clones share the same watchers, queues and
/// phase. Watch functions, listeners and queued tasks receive `&Scope`, so
/// they rarely need to capture a handle themselves. A callback that does
/// capture one keeps the scope alive for as long as the callback is
/// registered.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

/// Builds a `Scope` from its collaborators.
pub struct ScopeBuilder {
    config: ScopeConfig,
    scheduler: Rc<dyn Scheduler>,
    error_handler: Rc<dyn ErrorHandler>,
}

impl ScopeBuilder {
    /// Starts a builder around the host scheduler.
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            config: ScopeConfig::default(),
            scheduler,
            error_handler: Rc::new(TracingErrorHandler),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ScopeConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the digest TTL.
    pub fn ttl(mut self, ttl: usize) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Replaces the handler receiving isolated callback failures.
    pub fn error_handler(mut self, handler: Rc<dyn ErrorHandler>) -> Self {
        self.error_handler = handler;
        self
    }

    /// Validates the configuration and creates the scope.
    pub fn build(self) -> Result<Scope> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    fn assemble(self) -> Scope {
        Scope {
            inner: Rc::new(ScopeInner {
                config: self.config,
                registry: Rc::new(RefCell::new(WatcherRegistry::new())),
                phase: PhaseCell::new(),
                async_queue: RefCell::new(TaskQueue::new()),
                apply_async_queue: RefCell::new(TaskQueue::new()),
                apply_async_pending: Cell::new(false),
                post_digest_queue: RefCell::new(TaskQueue::new()),
                scheduler: self.scheduler,
                error_handler: self.error_handler,
            }),
        }
    }
}

impl Scope {
    /// Creates a scope with the default configuration and tracing error
    /// handler.
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        // The default configuration is always valid.
        ScopeBuilder::new(scheduler).assemble()
    }

    /// Starts a builder for a scope with custom configuration.
    pub fn builder(scheduler: Rc<dyn Scheduler>) -> ScopeBuilder {
        ScopeBuilder::new(scheduler)
    }

    // ==================== Registration ====================

    /// Registers a watcher.
    ///
    /// `watch_fn` runs on every digest pass. `listener_fn` runs with
    /// `(new, old, scope)` whenever the result differs from the last one, and
    /// always on the first digest after registration (with `old == new`).
    /// With `value_eq` the comparison is structural and a deep snapshot is
    /// retained; otherwise composites compare by handle. Cyclic composites
    /// work under both policies, but a retained snapshot of a cycle is itself
    /// a cycle and is never freed.
    pub fn watch<W, L>(&self, watch_fn: W, listener_fn: L, value_eq: bool) -> Deregister
    where
        W: FnMut(&Scope) -> core::result::Result<Value, CallbackError> + 'static,
        L: FnMut(&Value, &Value, &Scope) -> core::result::Result<(), CallbackError> + 'static,
    {
        self.register(Box::new(watch_fn), Box::new(listener_fn), value_eq)
    }

    /// Registers a watcher without a listener.
    ///
    /// Useful for watch functions that act by side effect; the watcher still
    /// takes part in convergence.
    pub fn watch_only<W>(&self, watch_fn: W) -> Deregister
    where
        W: FnMut(&Scope) -> core::result::Result<Value, CallbackError> + 'static,
    {
        self.register(Box::new(watch_fn), Box::new(|_, _, _| Ok(())), false)
    }

    pub(crate) fn register(&self, watch_fn: WatchFn, listener_fn: ListenerFn, value_eq: bool) -> Deregister {
        let registry = &self.inner.registry;
        let watcher = registry.borrow_mut().push(watch_fn, listener_fn, value_eq);
        trace!(watcher = watcher.id(), value_eq, "watcher registered");
        Deregister::new(registry, &watcher)
    }

    // ==================== Digest ====================

    /// Runs the digest loop until every watcher is stable.
    ///
    /// Fails with `Error::ReentrantPhase` if a digest or apply is already in
    /// progress, and with `Error::UnstableDigest` if the watchers are still
    /// changing after `ttl` passes. Failures of individual callables are
    /// reported to the error handler and never abort the loop. Post-digest
    /// callbacks run only after a converged digest.
    pub fn digest(&self) -> Result<()> {
        let phase = self.inner.phase.enter(Phase::Digest)?;
        let ttl = self.inner.config.ttl;

        self.inner.registry.borrow_mut().clear_last_dirty();
        if self.inner.apply_async_pending.get() {
            self.flush_apply_async();
        }

        debug!(ttl, watchers = self.watcher_count(), "digest started");

        let mut passes = 0;
        loop {
            let dirty = self.digest_once();
            let drained = self.drain_async_queue();
            passes += 1;
            trace!(pass = passes, dirty, drained, "digest pass finished");

            if !dirty && drained == 0 {
                break;
            }
            if passes >= ttl {
                drop(phase);
                warn!(ttl, "digest did not converge");
                return Err(Error::unstable_digest(ttl));
            }
        }

        drop(phase);
        debug!(passes, "digest converged");

        self.drain_post_digest_queue();
        Ok(())
    }

    /// Runs one pass over the registry and returns whether anything changed.
    pub(crate) fn digest_once(&self) -> bool {
        let registry = &self.inner.registry;
        let watchers = registry.borrow_mut().begin_pass();
        let mut dirty = false;

        for watcher in &watchers {
            if !watcher.is_registered() {
                continue;
            }

            let current = match watcher.evaluate(self) {
                Ok(value) => value,
                Err(e) => {
                    self.report(Error::WatcherEvaluation(e));
                    continue;
                }
            };

            match watcher.observe(current) {
                Observation::Changed { current, previous } => {
                    registry.borrow_mut().mark_dirty(watcher);
                    dirty = true;
                    if let Err(e) = watcher.notify(&current, &previous, self) {
                        self.report(Error::Listener(e));
                    }
                }
                Observation::Unchanged => {
                    let is_last_dirty = registry.borrow().is_last_dirty(watcher);
                    if is_last_dirty {
                        trace!(watcher = watcher.id(), "pass short-circuited");
                        return false;
                    }
                }
            }
        }

        // A watcher registered during the pass has not been evaluated yet.
        let added = registry.borrow().added_since_pass();
        dirty || added
    }

    fn drain_async_queue(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.inner.async_queue.borrow_mut().pop();
            let Some(task) = task else {
                break;
            };
            ran += 1;
            if let Err(e) = self.eval(task) {
                self.report(Error::AsyncTask(e));
            }
        }
        ran
    }

    fn drain_post_digest_queue(&self) {
        loop {
            let task = self.inner.post_digest_queue.borrow_mut().pop();
            let Some(task) = task else {
                break;
            };
            if let Err(e) = task(self) {
                self.report(Error::PostDigestTask(e));
            }
        }
    }

    // ==================== Entry points ====================

    /// Evaluates `expr` against this scope and returns its result.
    ///
    /// No phase is entered and no digest is triggered.
    pub fn eval<R, F>(&self, expr: F) -> R
    where
        F: FnOnce(&Scope) -> R,
    {
        expr(self)
    }

    /// Evaluates `expr` inside the apply phase, then digests.
    ///
    /// The digest runs whether or not `expr` failed. An `expr` failure is
    /// returned as `Error::Expression` once the digest has completed; a
    /// digest failure takes precedence, in which case the expression failure
    /// is handed to the error handler instead.
    pub fn apply<T, F>(&self, expr: F) -> Result<T>
    where
        F: FnOnce(&Scope) -> core::result::Result<T, CallbackError>,
    {
        let outcome = {
            let _phase = self.inner.phase.enter(Phase::Apply)?;
            self.eval(expr)
        };

        if let Err(e) = self.digest() {
            if let Err(expr_err) = outcome {
                self.report(Error::Expression(expr_err));
            }
            return Err(e);
        }
        outcome.map_err(Error::Expression)
    }

    /// Queues `expr` to run inside the next digest.
    ///
    /// If no phase is active and the queue was empty, a digest is requested
    /// from the scheduler for the next turn. When that turn comes the digest
    /// only runs if the queue still holds work.
    pub fn eval_async<F>(&self, expr: F)
    where
        F: FnOnce(&Scope) -> core::result::Result<(), CallbackError> + 'static,
    {
        let schedule = self.inner.phase.current().is_idle() && self.inner.async_queue.borrow().is_empty();
        self.inner.async_queue.borrow_mut().push(Box::new(expr));

        if schedule {
            let weak = Rc::downgrade(&self.inner);
            self.inner.scheduler.schedule_on_next_turn(Box::new(move || {
                let Some(scope) = Scope::upgrade(&weak) else {
                    return;
                };
                if scope.async_queue_len() == 0 {
                    trace!("scheduled digest skipped, async queue already drained");
                    return;
                }
                if let Err(e) = scope.digest() {
                    scope.report(e);
                }
            }));
        }
    }

    /// Queues `expr` to run in a coalesced apply on the next turn.
    ///
    /// Every expression queued before the scheduled flush runs inside one
    /// apply, so a burst of calls costs a single digest. A digest that starts
    /// earlier flushes the queue itself and the scheduled flush does nothing.
    pub fn apply_async<F>(&self, expr: F)
    where
        F: FnOnce(&Scope) -> core::result::Result<(), CallbackError> + 'static,
    {
        self.inner.apply_async_queue.borrow_mut().push(Box::new(expr));
        if self.inner.apply_async_pending.replace(true) {
            return;
        }

        let weak = Rc::downgrade(&self.inner);
        self.inner.scheduler.schedule_on_next_turn(Box::new(move || {
            let Some(scope) = Scope::upgrade(&weak) else {
                return;
            };
            if !scope.inner.apply_async_pending.get() {
                return;
            }
            let flushed = scope.apply(|scope| {
                scope.flush_apply_async();
                Ok(())
            });
            if let Err(e) = flushed {
                scope.report(e);
            }
        }));
    }

    fn flush_apply_async(&self) {
        self.inner.apply_async_pending.set(false);
        loop {
            let task = self.inner.apply_async_queue.borrow_mut().pop();
            let Some(task) = task else {
                break;
            };
            if let Err(e) = task(self) {
                self.report(Error::AsyncTask(e));
            }
        }
    }

    /// Queues `callback` to run once after the next converged digest.
    pub fn post_digest<F>(&self, callback: F)
    where
        F: FnOnce(&Scope) -> core::result::Result<(), CallbackError> + 'static,
    {
        self.inner.post_digest_queue.borrow_mut().push(Box::new(callback));
    }

    // ==================== Introspection ====================

    /// Returns the phase currently in progress.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.inner.phase.current()
    }

    /// Returns the scope configuration.
    #[inline]
    pub fn config(&self) -> &ScopeConfig {
        &self.inner.config
    }

    /// Returns the number of registered watchers.
    pub fn watcher_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    /// Returns the registered watcher IDs in evaluation order.
    pub fn watcher_ids(&self) -> Vec<WatcherId> {
        self.inner.registry.borrow().watcher_ids()
    }

    /// Returns the number of expressions waiting for a digest.
    pub fn async_queue_len(&self) -> usize {
        self.inner.async_queue.borrow().len()
    }

    /// Returns the number of callbacks waiting for a converged digest.
    pub fn post_digest_len(&self) -> usize {
        self.inner.post_digest_queue.borrow().len()
    }

    /// Returns the number of expressions waiting for an apply-async flush.
    pub fn apply_async_len(&self) -> usize {
        self.inner.apply_async_queue.borrow().len()
    }

    /// Hands an isolated failure to the error handler.
    pub(crate) fn report(&self, error: Error) {
        self.inner.error_handler.handle(&error);
    }

    fn upgrade(weak: &Weak<ScopeInner>) -> Option<Scope> {
        weak.upgrade().map(|inner| Scope { inner })
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.borrow();
        f.debug_struct("Scope")
            .field("phase", &self.phase())
            .field("watchers", &registry.len())
            .field("has_watchers", &!registry.is_empty())
            .field("async_queue", &self.async_queue_len())
            .field("post_digest_queue", &self.post_digest_len())
            .field("ttl", &self.inner.config.ttl)
            .finish()
    }
}
