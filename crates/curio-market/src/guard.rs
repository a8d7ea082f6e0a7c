//! Reentrancy guard.
//!
//! Every mutating engine operation holds a [`ReentrancySpan`] across
//! its external custody and discount calls. If such a call re-enters
//! the engine before the triggering operation finishes, the nested
//! entry fails fast instead of observing half-applied state. The span
//! releases on drop, so every exit path, including errors, clears
//! the gate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{MarketError, Result};

/// Mutual-exclusion gate for mutating operations.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    busy: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    /// Creates a released guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the gate for one operation.
    ///
    /// # Errors
    ///
    /// Returns `Reentrancy` if an operation is already in flight.
    pub fn enter(&self) -> Result<ReentrancySpan> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            return Err(MarketError::Reentrancy);
        }
        Ok(ReentrancySpan {
            busy: Arc::clone(&self.busy),
        })
    }

    /// Returns true while an operation holds the gate.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// RAII token for one guarded operation; releases the gate on drop.
#[derive(Debug)]
pub struct ReentrancySpan {
    busy: Arc<AtomicBool>,
}

impl Drop for ReentrancySpan {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_acquires_and_drop_releases() {
        let guard = ReentrancyGuard::new();
        assert!(!guard.is_busy());

        let span = guard.enter().expect("first entry");
        assert!(guard.is_busy());

        drop(span);
        assert!(!guard.is_busy());
    }

    #[test]
    fn nested_enter_fails_fast() {
        let guard = ReentrancyGuard::new();
        let _span = guard.enter().expect("first entry");

        let nested = guard.enter();
        assert!(matches!(nested, Err(MarketError::Reentrancy)));
    }

    #[test]
    fn gate_reusable_after_release() {
        let guard = ReentrancyGuard::new();
        drop(guard.enter().expect("first"));
        drop(guard.enter().expect("second"));
        assert!(!guard.is_busy());
    }

    #[test]
    fn release_happens_on_error_paths_too() {
        let guard = ReentrancyGuard::new();
        let failing = || -> Result<()> {
            let _span = guard.enter()?;
            Err(MarketError::InvalidPrice)
        };
        assert!(failing().is_err());
        assert!(!guard.is_busy());
    }
}
