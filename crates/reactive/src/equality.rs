//! Equality policy.
//!
//! A watcher compares by identity unless it was registered with value
//! equality, in which case it compares structurally and retains a deep
//! snapshot rather than the caller's handle.

use settle_core::Value;

/// The last value a watcher observed.
#[derive(Clone, Debug, Default)]
pub enum Observed {
    /// Never evaluated. Differs from every value, including `Value::Null`.
    #[default]
    Unset,
    /// Retained result of the last evaluation that counted as a change.
    Value(Value),
}

impl Observed {
    /// Returns true if nothing was observed yet.
    #[inline]
    pub fn is_unset(&self) -> bool {
        matches!(self, Observed::Unset)
    }

    /// Returns the retained value, if any.
    #[inline]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Observed::Unset => None,
            Observed::Value(v) => Some(v),
        }
    }
}

/// Compares a fresh evaluation against the retained observation.
pub fn are_equal(current: &Value, previous: &Observed, value_eq: bool) -> bool {
    match previous {
        Observed::Unset => false,
        Observed::Value(previous) if value_eq => current.deep_eq(previous),
        Observed::Value(previous) => current.identical(previous),
    }
}

/// Returns what a watcher should keep for the next comparison.
pub fn retain(current: &Value, value_eq: bool) -> Value {
    if value_eq {
        current.snapshot()
    } else {
        current.clone()
    }
}
