//! Scope phase marker.

use core::fmt;

/// The cycle a scope is currently executing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing in progress
    #[default]
    Idle,
    /// A digest loop is running
    Digest,
    /// An apply expression is being evaluated
    Apply,
}

impl Phase {
    /// Returns true if no cycle is in progress.
    #[inline]
    pub fn is_idle(self) -> bool {
        matches!(self, Phase::Idle)
    }

    /// Returns the phase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Digest => "digest",
            Phase::Apply => "apply",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
