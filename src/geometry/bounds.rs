//! Axis-aligned bounds of a point set and their cache.
//!
//! Bounds are recomputed from scratch on every cache miss by a fork/join
//! reduction over the points: each worker widens a local box, and local boxes
//! are merged by componentwise min/max.

use crate::algs::reduce::ParallelReducer;
use crate::clock::CacheStamp;
use std::fmt;

/// Bounding box `(xmin, xmax, ymin, ymax, zmin, zmax)`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds(pub [f64; 6]);

impl Bounds {
    /// Sentinel for "no points": every axis has `min > max`.
    ///
    /// Distinct from `(0, 0, 0, 0, 0, 0)`, which is a valid degenerate box.
    pub const UNINITIALIZED: Bounds = Bounds([1.0, -1.0, 1.0, -1.0, 1.0, -1.0]);

    /// Identity for [`Bounds::merge`]: `+inf` minima and `-inf` maxima.
    pub const EMPTY: Bounds = Bounds([
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
    ]);

    /// Minimum on `axis` (0 = x, 1 = y, 2 = z).
    #[inline]
    pub fn min(&self, axis: usize) -> f64 {
        self.0[2 * axis]
    }

    /// Maximum on `axis`.
    #[inline]
    pub fn max(&self, axis: usize) -> f64 {
        self.0[2 * axis + 1]
    }

    /// Return true if `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|a| self.min(a) <= self.max(a))
    }

    /// Widen to contain `p`. NaN coordinates are ignored.
    #[inline]
    pub fn add_point(&mut self, p: [f64; 3]) {
        for (axis, &x) in p.iter().enumerate() {
            if x < self.0[2 * axis] {
                self.0[2 * axis] = x;
            }
            if x > self.0[2 * axis + 1] {
                self.0[2 * axis + 1] = x;
            }
        }
    }

    /// Componentwise union of two boxes.
    pub fn merge(self, other: Bounds) -> Bounds {
        let mut out = self;
        for axis in 0..3 {
            if other.min(axis) < out.0[2 * axis] {
                out.0[2 * axis] = other.min(axis);
            }
            if other.max(axis) > out.0[2 * axis + 1] {
                out.0[2 * axis + 1] = other.max(axis);
            }
        }
        out
    }

    /// Per-axis midpoint.
    pub fn center(&self) -> [f64; 3] {
        std::array::from_fn(|a| (self.max(a) + self.min(a)) / 2.0)
    }

    /// Squared length of the diagonal; zero for an invalid box.
    pub fn length2(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        (0..3)
            .map(|a| {
                let d = self.max(a) - self.min(a);
                d * d
            })
            .sum()
    }

    /// Length of the diagonal.
    pub fn length(&self) -> f64 {
        self.length2().sqrt()
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::UNINITIALIZED
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "x: ({}, {}) y: ({}, {}) z: ({}, {})",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Compute the bounds of points `0..n` read through `point`.
///
/// Returns [`Bounds::UNINITIALIZED`] when `n == 0`, and also when NaN
/// coordinates leave some axis without any finite extent.
pub fn compute_bounds<F>(reducer: &ParallelReducer, n: usize, point: F) -> Bounds
where
    F: Fn(usize) -> [f64; 3] + Sync,
{
    if n == 0 {
        return Bounds::UNINITIALIZED;
    }
    let b = reducer.reduce(
        n,
        || Bounds::EMPTY,
        |local, i| local.add_point(point(i)),
        Bounds::merge,
    );
    if b.is_valid() {
        b
    } else {
        log::debug!("no usable coordinates among {n} points");
        Bounds::UNINITIALIZED
    }
}

/// Cached bounds stamped with the aggregate clock they were computed against.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeometryCache {
    bounds: Bounds,
    stamp: CacheStamp,
}

impl GeometryCache {
    /// Cached bounds if still valid against `current`.
    pub fn lookup(&self, current: u64) -> Option<Bounds> {
        self.stamp.is_fresh(current).then_some(self.bounds)
    }

    /// Store `bounds` computed from inputs whose aggregate clock read
    /// `snapshot`. An older snapshot never overwrites a newer one.
    pub fn store(&mut self, bounds: Bounds, snapshot: u64) {
        if snapshot >= self.stamp.get() {
            self.bounds = bounds;
            self.stamp = CacheStamp::at(snapshot);
        }
    }

    /// Last stored bounds, fresh or not.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Stamp of the last stored bounds.
    pub fn stamp(&self) -> CacheStamp {
        self.stamp
    }

    /// Forget the cached value.
    pub fn clear(&mut self) {
        *self = GeometryCache::default();
    }
}
