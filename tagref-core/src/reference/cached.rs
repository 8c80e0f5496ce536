//! Cached Computation
//!
//! [`Cached`] is the memoization block every derived reference is built
//! from. It records the tag revision observed right before the last
//! computation and reuses the result for as long as the tag still validates
//! that revision.
//!
//! # How It Works
//!
//! 1. On first access there is no recorded revision, so the value is
//!    computed.
//!
//! 2. Before computing, the tag's current revision is recorded. Anything
//!    that changes during the computation therefore shows up as stale on the
//!    next read.
//!
//! 3. On later accesses, `tag.validate(recorded)` decides between returning
//!    the cached value and recomputing.
//!
//! 4. A failed computation is absorbed: the error is logged and the neutral
//!    value (`T::default()`) is cached in its place.
//!
//! The cache lock is never held while computing, so computations may freely
//! read other references.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::EvalError;
use crate::tag::{Revision, Tag};

/// Freshness of a cached value relative to a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing has been computed yet, or the cache was invalidated.
    Empty,

    /// The cached value is up-to-date.
    Valid,

    /// The tag advanced past the recorded revision.
    Stale,
}

struct Slot<T> {
    revision: Revision,
    value: T,
}

/// A value memoized against a tag revision.
pub struct Cached<T> {
    slot: Mutex<Option<Slot<T>>>,
    computations: AtomicU64,
}

impl<T> Cached<T>
where
    T: Clone + Default,
{
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            computations: AtomicU64::new(0),
        }
    }

    /// Return the cached value, recomputing first if `tag` no longer
    /// validates the recorded revision.
    pub fn get<F>(&self, tag: &Tag, compute: F) -> T
    where
        F: FnOnce() -> Result<T, EvalError>,
    {
        if let Some(value) = self.fresh(tag) {
            return value;
        }

        let revision = tag.value();
        let value = match compute() {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(%error, "evaluation degraded to neutral value");
                T::default()
            }
        };
        self.computations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(revision, "reference recomputed");

        *self.slot.lock() = Some(Slot {
            revision,
            value: value.clone(),
        });
        value
    }

    fn fresh(&self, tag: &Tag) -> Option<T> {
        match &*self.slot.lock() {
            Some(slot) if tag.validate(slot.revision) => Some(slot.value.clone()),
            _ => None,
        }
    }

    /// Drop the recorded revision so the next read recomputes regardless of
    /// the tag.
    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }

    /// The revision recorded at the last computation.
    pub fn revision(&self) -> Option<Revision> {
        self.slot.lock().as_ref().map(|slot| slot.revision)
    }

    /// Freshness of the cached value against `tag`.
    pub fn state(&self, tag: &Tag) -> CacheState {
        match &*self.slot.lock() {
            None => CacheState::Empty,
            Some(slot) if tag.validate(slot.revision) => CacheState::Valid,
            Some(_) => CacheState::Stale,
        }
    }

    /// How many times a value has been computed.
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }
}

impl<T> Default for Cached<T>
where
    T: Clone + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Cached<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cached")
            .field("revision", &self.slot.lock().as_ref().map(|slot| slot.revision))
            .field("computations", &self.computations.load(Ordering::Relaxed))
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Clock;
    use std::sync::atomic::AtomicI32;
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicI32>, value: i32) -> impl FnOnce() -> Result<i32, EvalError> {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[test]
    fn computes_on_first_access() {
        let clock = Clock::new();
        let tag = Tag::dirtyable(&clock);
        let cache = Cached::new();
        let call_count = Arc::new(AtomicI32::new(0));

        assert_eq!(cache.state(&tag), CacheState::Empty);
        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        assert_eq!(cache.get(&tag, counting(&call_count, 42)), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state(&tag), CacheState::Valid);
    }

    #[test]
    fn caches_while_tag_is_valid() {
        let clock = Clock::new();
        let tag = Tag::dirtyable(&clock);
        let cache = Cached::new();
        let call_count = Arc::new(AtomicI32::new(0));

        for _ in 0..5 {
            assert_eq!(cache.get(&tag, counting(&call_count, 42)), 42);
        }
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn recomputes_after_dirty() {
        let clock = Clock::new();
        let tag = Tag::dirtyable(&clock);
        let cache = Cached::new();
        let call_count = Arc::new(AtomicI32::new(0));

        assert_eq!(cache.get(&tag, counting(&call_count, 1)), 1);

        tag.dirty();
        assert_eq!(cache.state(&tag), CacheState::Stale);
        assert_eq!(cache.get(&tag, counting(&call_count, 2)), 2);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
        assert_eq!(cache.revision(), Some(tag.value()));
    }

    #[test]
    fn constant_tag_never_recomputes() {
        let clock = Clock::new();
        let tag = Tag::constant();
        let cache = Cached::new();
        let call_count = Arc::new(AtomicI32::new(0));

        assert_eq!(cache.get(&tag, counting(&call_count, 7)), 7);
        for _ in 0..3 {
            Tag::dirtyable(&clock).dirty();
            assert_eq!(cache.get(&tag, counting(&call_count, 8)), 7);
        }
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn volatile_tag_always_recomputes() {
        let tag = Tag::volatile();
        let cache = Cached::new();
        let call_count = Arc::new(AtomicI32::new(0));

        cache.get(&tag, counting(&call_count, 1));
        cache.get(&tag, counting(&call_count, 1));
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let clock = Clock::new();
        let tag = Tag::dirtyable(&clock);
        let cache = Cached::new();
        let call_count = Arc::new(AtomicI32::new(0));

        cache.get(&tag, counting(&call_count, 1));
        cache.invalidate();
        assert_eq!(cache.state(&tag), CacheState::Empty);

        assert_eq!(cache.get(&tag, counting(&call_count, 2)), 2);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn errors_degrade_to_default_and_are_cached() {
        let clock = Clock::new();
        let tag = Tag::dirtyable(&clock);
        let cache: Cached<i32> = Cached::new();

        let value = cache.get(&tag, || Err(EvalError::Helper("boom".to_string())));
        assert_eq!(value, 0);
        assert_eq!(cache.state(&tag), CacheState::Valid);
        assert_eq!(cache.get(&tag, || Ok(5)), 0);
    }
}
