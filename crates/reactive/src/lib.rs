//! Settle Reactive - Dirty-checking scope for the settle digest core.
//!
//! This crate implements a scope that holds watchers over derived values and
//! a digest loop that re-evaluates them until nothing changes, calling each
//! watcher's listener for every change it sees.
//!
//! # Core Concepts
//!
//! - `Scope`: Owns the watchers, the deferred queues and the phase guard
//! - `Watcher`: A watch function, a listener, and the last observed value
//! - `Deregister`: Handle removing exactly one watcher
//! - `Scheduler`: Host hook that runs deferred digests on a later turn
//! - `ErrorHandler`: Receives callback failures that must not abort a digest
//!
//! # Key Features
//!
//! - `watch()` / `watch_group()`: Register what to watch and what to do on change
//! - `digest()`: Converge all watchers, bounded by the configured TTL
//! - `apply()`: Evaluate an expression, then digest
//! - `eval_async()` / `apply_async()`: Defer work to the next digest or turn
//! - `post_digest()`: Run a callback once after the next converged digest
//!
//! # Example
//!
//! ```ignore
//! use settle_reactive::{ManualScheduler, Scope, Value};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let scope = Scope::new(scheduler.clone());
//!
//! let counter = Rc::new(Cell::new(0));
//! let source = counter.clone();
//! scope.watch(
//!     move |_| Ok(Value::Int64(source.get())),
//!     |new, old, _| {
//!         println!("counter: {} -> {}", old, new);
//!         Ok(())
//!     },
//!     false,
//! );
//!
//! scope.apply(|_| {
//!     counter.set(1);
//!     Ok(())
//! })?;
//!
//! // Deferred work runs when the host turns its loop.
//! scope.eval_async(|_| Ok(()));
//! scheduler.run_pending();
//! ```

#![no_std]

extern crate alloc;

pub mod config;
pub mod equality;
pub mod group;
mod phase;
pub mod queue;
mod registry;
pub mod report;
pub mod scheduler;
pub mod scope;
pub mod watcher;

pub use config::{ScopeConfig, DEFAULT_DIGEST_TTL};
pub use equality::{are_equal, Observed};
pub use group::GroupDeregister;
pub use queue::{AsyncTask, PostDigestTask};
pub use report::{ErrorHandler, TracingErrorHandler};
pub use scheduler::{ManualScheduler, Scheduler, Task};
pub use scope::{Scope, ScopeBuilder};
pub use watcher::{Deregister, ListenerFn, WatchFn, Watcher, WatcherId};

// Re-export commonly used types from settle-core
pub use settle_core::{CallbackError, Error, Phase, Result, Value};
