//! Backend health state
//!
//! Coarse, shared-across-conversations signal: after the preferred backend
//! fails twice within one turn, skip straight to the secondary for the next
//! N calls. Updated lock-free; staleness is acceptable because this is an
//! optimization, never a correctness requirement.

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Default)]
pub(crate) struct BackendHealth {
    /// Remaining calls that should go straight to the secondary backend
    skip_preferred: AtomicU32,
}

impl BackendHealth {
    /// Consume one skip token if any remain
    ///
    /// Concurrent callers may each consume a token; the window is a budget,
    /// not an exact schedule.
    pub(crate) fn should_skip_preferred(&self) -> bool {
        self.skip_preferred
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1))
            .is_ok()
    }

    /// Preferred backend exhausted its in-turn retries; degrade for `window`
    /// subsequent calls
    pub(crate) fn mark_degraded(&self, window: u32) {
        self.skip_preferred.store(window, Ordering::Relaxed);
    }

    /// Preferred backend answered; clear any remaining skip window
    pub(crate) fn mark_healthy(&self) {
        self.skip_preferred.store(0, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> u32 {
        self.skip_preferred.load(Ordering::Relaxed)
    }
}
