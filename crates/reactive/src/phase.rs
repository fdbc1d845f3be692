//! Phase guard.
//!
//! A scope runs at most one digest or apply at a time. `PhaseCell::enter`
//! hands out a `PhaseToken` that resets the cell to idle when dropped, so the
//! phase is cleared on every exit path including early error returns.

use core::cell::Cell;
use settle_core::{Error, Phase, Result};

/// Non-reentrant phase marker owned by a scope.
#[derive(Debug, Default)]
pub(crate) struct PhaseCell {
    phase: Cell<Phase>,
}

impl PhaseCell {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn current(&self) -> Phase {
        self.phase.get()
    }

    /// Enters `phase`, failing if another phase is already active.
    pub(crate) fn enter(&self, phase: Phase) -> Result<PhaseToken<'_>> {
        let active = self.phase.get();
        if !active.is_idle() {
            return Err(Error::reentrant_phase(active, phase));
        }
        self.phase.set(phase);
        Ok(PhaseToken { cell: self })
    }
}

/// Proof that a phase is active. Dropping it clears the phase.
#[must_use = "the phase is cleared as soon as the token is dropped"]
pub(crate) struct PhaseToken<'a> {
    cell: &'a PhaseCell,
}

impl Drop for PhaseToken<'_> {
    fn drop(&mut self) {
        self.cell.phase.set(Phase::Idle);
    }
}
