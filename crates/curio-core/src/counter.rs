//! Monotonically-incrementing counter primitive.
//!
//! Drives listing id assignment and the sold/cancelled tallies. A
//! counter only ever moves forward; values handed out are never
//! reused.

use serde::{Deserialize, Serialize};

/// A monotonic counter starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counter(u64);

impl Counter {
    /// Creates a counter at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Returns the current value without advancing.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Advances the counter and returns the new value.
    ///
    /// The first call returns 1, so zero is never handed out and can
    /// safely mean "absent" to callers that need a sentinel.
    pub fn increment(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_zero() {
        assert_eq!(Counter::new().value(), 0);
    }

    #[test]
    fn increment_returns_one_first() {
        let mut counter = Counter::new();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.value(), 1);
    }

    #[test]
    fn increment_is_monotonic() {
        let mut counter = Counter::new();
        let mut last = 0;
        for _ in 0..100 {
            let next = counter.increment();
            assert!(next > last);
            last = next;
        }
        assert_eq!(counter.value(), 100);
    }

    #[test]
    fn serde_roundtrip() {
        let mut counter = Counter::new();
        counter.increment();
        counter.increment();
        let json = serde_json::to_string(&counter).unwrap();
        assert_eq!(json, "2");
        let restored: Counter = serde_json::from_str(&json).unwrap();
        assert_eq!(counter, restored);
    }
}
