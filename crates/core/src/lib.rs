//! Settle Core - Value model and error types for the settle digest core.
//!
//! This crate provides the foundational types shared by the scope machinery:
//!
//! - `Value`: Runtime values a watcher can observe, with shared composites
//! - `Phase`: The cycle a scope is executing (idle, digest, apply)
//! - `Error`: Error types for scope operations
//!
//! # Example
//!
//! ```rust
//! use settle_core::Value;
//!
//! let a = Value::list(vec![Value::Int64(1), Value::from("two")]);
//! let b = a.snapshot();
//!
//! // Same content, different handles.
//! assert!(a.deep_eq(&b));
//! assert!(!a.identical(&b));
//!
//! a.items_mut().unwrap().push(Value::Null);
//! assert!(!a.deep_eq(&b));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod phase;
mod value;

pub use error::{CallbackError, Error, Result};
pub use phase::Phase;
pub use value::{ListRef, MapRef, Value};
