//! Revision Clock
//!
//! The clock is the process-wide revision counter that every dirtyable tag
//! advances. It is an explicit value rather than a hidden static: whoever
//! builds the reference graph creates one clock and threads it through the
//! [`Env`](crate::Env) and into every tag that needs it.
//!
//! Clones share the same counter.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A monotonically increasing revision number.
pub type Revision = u64;

/// The revision reported by constant tags. Every snapshot validates it.
pub const CONSTANT_REVISION: Revision = 0;

/// The global mutation clock.
#[derive(Clone, Default)]
pub struct Clock {
    counter: Arc<AtomicU64>,
}

impl Clock {
    /// Create a new clock starting at revision 0.
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(CONSTANT_REVISION)),
        }
    }

    /// The current revision.
    pub fn now(&self) -> Revision {
        self.counter.load(Ordering::SeqCst)
    }

    /// Advance the clock and return the new revision.
    pub fn bump(&self) -> Revision {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether two handles share the same counter.
    pub fn same(&self, other: &Clock) -> bool {
        Arc::ptr_eq(&self.counter, &other.counter)
    }
}

impl Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock").field("now", &self.now()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_zero() {
        let clock = Clock::new();
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn bump_returns_new_revision() {
        let clock = Clock::new();
        assert_eq!(clock.bump(), 1);
        assert_eq!(clock.bump(), 2);
        assert_eq!(clock.now(), 2);
    }

    #[test]
    fn clones_share_counter() {
        let clock = Clock::new();
        let other = clock.clone();

        other.bump();
        assert_eq!(clock.now(), 1);
        assert!(clock.same(&other));
        assert!(!clock.same(&Clock::new()));
    }
}
