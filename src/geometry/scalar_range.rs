//! Combined point/cell scalar range and its cache.

use crate::algs::reduce::ParallelReducer;
use crate::clock::CacheStamp;
use crate::data::attributes::AttributeSet;
use serde::{Deserialize, Serialize};

/// Scalar value range `(min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalarRange(pub f64, pub f64);

impl ScalarRange {
    /// Range reported when neither points nor cells have scalars.
    pub const DEFAULT: ScalarRange = ScalarRange(0.0, 1.0);

    pub fn min(&self) -> f64 {
        self.0
    }

    pub fn max(&self) -> f64 {
        self.1
    }

    /// Union of two ranges.
    pub fn union(self, other: ScalarRange) -> ScalarRange {
        ScalarRange(self.0.min(other.0), self.1.max(other.1))
    }
}

impl Default for ScalarRange {
    fn default() -> Self {
        ScalarRange::DEFAULT
    }
}

impl From<(f64, f64)> for ScalarRange {
    fn from((lo, hi): (f64, f64)) -> Self {
        ScalarRange(lo, hi)
    }
}

/// Ghost-excluded range of component 0 of `attrs`' active scalars.
///
/// `None` if there are no active scalars or every tuple is masked.
pub fn attribute_scalar_range(
    reducer: &ParallelReducer,
    attrs: &AttributeSet,
) -> Option<ScalarRange> {
    let scalars = attrs.scalars()?;
    let ghosts = attrs.ghost_array();
    let ghost_guard = ghosts.as_ref().map(|g| g.read());
    let ghost_bits = ghost_guard.as_ref().and_then(|g| g.as_slice::<u8>().ok());
    let array = scalars.read();
    array
        .range(reducer, 0, ghost_bits, attrs.ghosts_to_skip())
        .map(ScalarRange::from)
}

/// Combine point and cell scalar ranges.
///
/// Both present: union. One present: that one. Neither: [`ScalarRange::DEFAULT`].
pub fn combine_ranges(points: Option<ScalarRange>, cells: Option<ScalarRange>) -> ScalarRange {
    match (points, cells) {
        (Some(p), Some(c)) => p.union(c),
        (Some(r), None) | (None, Some(r)) => r,
        (None, None) => ScalarRange::DEFAULT,
    }
}

/// Cached scalar range stamped with the aggregate clock it was computed against.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarRangeCache {
    range: ScalarRange,
    stamp: CacheStamp,
}

impl ScalarRangeCache {
    /// Cached range if still valid against `current`.
    pub fn lookup(&self, current: u64) -> Option<ScalarRange> {
        self.stamp.is_fresh(current).then_some(self.range)
    }

    /// Store a range computed from inputs whose aggregate clock read `snapshot`.
    pub fn store(&mut self, range: ScalarRange, snapshot: u64) {
        if snapshot >= self.stamp.get() {
            self.range = range;
            self.stamp = CacheStamp::at(snapshot);
        }
    }

    /// Last stored range, fresh or not.
    pub fn range(&self) -> ScalarRange {
        self.range
    }

    pub fn stamp(&self) -> CacheStamp {
        self.stamp
    }

    pub fn clear(&mut self) {
        *self = ScalarRangeCache::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::array::DataArray;
    use crate::data::attributes::AttributeKind;
    use crate::data::ghost::{GHOST_ARRAY_NAME, PointGhost};

    #[test]
    fn combination_rule() {
        let p = Some(ScalarRange(0.0, 10.0));
        let c = Some(ScalarRange(5.0, 20.0));
        assert_eq!(combine_ranges(p, c), ScalarRange(0.0, 20.0));
        assert_eq!(combine_ranges(p, None), ScalarRange(0.0, 10.0));
        assert_eq!(combine_ranges(None, c), ScalarRange(5.0, 20.0));
        assert_eq!(combine_ranges(None, None), ScalarRange(0.0, 1.0));
    }

    #[test]
    fn hidden_points_are_skipped() {
        let r = ParallelReducer::serial();
        let mut set = AttributeSet::new(AttributeKind::Point);
        set.set_scalars(DataArray::single_component("s", vec![1.0, 50.0, 3.0]));
        let hidden = PointGhost::HIDDEN_POINT.bits();
        set.add_array(DataArray::single_component(GHOST_ARRAY_NAME, vec![0u8, hidden, 0]));
        assert_eq!(attribute_scalar_range(&r, &set), Some(ScalarRange(1.0, 3.0)));

        // duplicate points are not in the default skip mask
        let dup = PointGhost::DUPLICATE_POINT.bits();
        set.add_array(DataArray::single_component(GHOST_ARRAY_NAME, vec![0u8, dup, 0]));
        assert_eq!(attribute_scalar_range(&r, &set), Some(ScalarRange(1.0, 50.0)));
    }
}
