//! Modification clocks and cache invalidation shared across datasets.
//!
//! Every mutable entity owns a [`ModificationClock`]. All clocks draw from one
//! process-wide monotonic counter, so values from different entities are
//! comparable: a derived value computed when the aggregate clock read `t` is
//! still valid while every input clock is `<= t`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of modification times. Zero is never handed out, so a
/// stamp of `0` always means "never computed".
static GLOBAL_TIME: AtomicU64 = AtomicU64::new(0);

/// Draw the next modification time from the global counter.
#[inline]
pub fn next_time() -> u64 {
    GLOBAL_TIME.fetch_add(1, Ordering::AcqRel) + 1
}

/// Monotonic version counter attached to a mutable entity.
///
/// A fresh clock is already stamped, so a new entity always reads as newer
/// than any cache that predates it.
#[derive(Debug)]
pub struct ModificationClock {
    time: AtomicU64,
}

impl ModificationClock {
    /// Create a clock stamped with a new modification time.
    pub fn new() -> Self {
        Self {
            time: AtomicU64::new(next_time()),
        }
    }

    /// Advance to a fresh modification time and return it.
    #[inline]
    pub fn modified(&self) -> u64 {
        let t = next_time();
        self.time.fetch_max(t, Ordering::AcqRel);
        t
    }

    /// Current modification time.
    #[inline]
    pub fn get(&self) -> u64 {
        self.time.load(Ordering::Acquire)
    }

    /// Copy another clock's value without advancing the global counter.
    pub fn copy_from(&self, other: &ModificationClock) {
        self.time.store(other.get(), Ordering::Release);
    }
}

impl Default for ModificationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ModificationClock {
    fn clone(&self) -> Self {
        Self {
            time: AtomicU64::new(self.get()),
        }
    }
}

/// Anything that caches derived values (bounds, scalar ranges, ghost handles)
/// should implement this.
pub trait InvalidateCache {
    /// Invalidate *all* internal caches so future queries recompute correctly.
    fn invalidate_cache(&mut self);
}

impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}

/// Timestamp of a cached value.
///
/// Valid iff the stamp is at least the aggregate clock of every input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStamp(u64);

impl CacheStamp {
    /// A stamp that is stale against every clock.
    pub const NEVER: CacheStamp = CacheStamp(0);

    /// Stamp recording the aggregate input clock `snapshot`.
    #[inline]
    pub fn at(snapshot: u64) -> Self {
        CacheStamp(snapshot)
    }

    /// Whether a value stamped this way is still valid against `current`.
    #[inline]
    pub fn is_fresh(self, current: u64) -> bool {
        self.0 != 0 && self.0 >= current
    }

    /// Raw stamp value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clocks_are_strictly_increasing_across_entities() {
        let a = ModificationClock::new();
        let b = ModificationClock::new();
        assert!(b.get() > a.get());
        let t = a.modified();
        assert_eq!(a.get(), t);
        assert!(a.get() > b.get());
    }

    #[test]
    fn stamp_freshness() {
        let c = ModificationClock::new();
        let stamp = CacheStamp::at(c.get());
        assert!(stamp.is_fresh(c.get()));
        c.modified();
        assert!(!stamp.is_fresh(c.get()));
        assert!(!CacheStamp::NEVER.is_fresh(0));
    }

    #[test]
    fn copy_from_does_not_advance() {
        let a = ModificationClock::new();
        let b = ModificationClock::new();
        b.copy_from(&a);
        assert_eq!(a.get(), b.get());
    }
}
