//! Duplicate (ghost) marking for structured sub-blocks.
//!
//! A sub-block of a decomposed structured grid stores its own extent `E`,
//! which may be padded with overlap layers around the canonical extent `Z`
//! it owns exclusively. Every point and cell of `E` that falls outside `Z`
//! is a duplicate of an entity owned by a neighbour and gets the duplicate
//! bit ORed into its ghost status.
//!
//! Distance to the owned region is the per-axis overflow combined with
//! `max` (Chebyshev); an entity is a duplicate when that distance is
//! positive.

use crate::algs::reduce::ParallelReducer;
use crate::data::array::{ArrayHandle, ScalarType};
use crate::data::attributes::{AttributeSet, new_ghost_array};
use crate::data::ghost::{CellGhost, GHOST_ARRAY_NAME, PointGhost};
use crate::topology::extent::Extent;
use itertools::iproduct;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Entities found outside the canonical extent by one classification pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GhostClassification {
    pub duplicate_points: usize,
    pub duplicate_cells: usize,
}

/// Overflow of point index `x` past the inclusive owned range `[lo, hi]`.
///
/// Points above the range count one extra layer, since the last owned
/// point of a tile is shared with the first cell of the next tile.
#[inline]
fn point_overflow(x: i64, lo: i64, hi: i64) -> i64 {
    let mut d = 0;
    if x < lo {
        d = lo - x;
    }
    if x > hi {
        d = x - hi + 1;
    }
    d
}

/// Overflow of cell index `x` past the exclusive owned range `[lo, hi)`.
#[inline]
fn cell_overflow(x: i64, lo: i64, hi: i64) -> i64 {
    let mut d = 0;
    if x < lo {
        d = lo - x;
    }
    if x >= hi {
        d = x - hi + 1;
    }
    d
}

/// Per-axis index ranges `(lo, hi)` in i64.
fn axes(e: &Extent) -> [(i64, i64); 3] {
    std::array::from_fn(|a| (i64::from(e.lo(a)), i64::from(e.hi(a))))
}

/// Scan a k-major block and OR `bit` into every entry whose distance to the
/// owned region is positive. Returns the number of such entries.
fn mark_block<D>(
    reducer: &ParallelReducer,
    ghosts: &mut [u8],
    own: [(i64, i64); 3],
    owned: [(i64, i64); 3],
    dims: [usize; 3],
    bit: u8,
    overflow: D,
) -> usize
where
    D: Fn(i64, i64, i64) -> i64 + Sync + Send,
{
    let plane = dims[0] * dims[1];
    let expected = plane * dims[2];
    if expected == 0 {
        return 0;
    }
    if ghosts.len() < expected {
        log::error!(
            "ghost array holds {} entries, structured block needs {expected}",
            ghosts.len()
        );
        return 0;
    }
    let marked = AtomicUsize::new(0);
    reducer.for_each_tile_mut(&mut ghosts[..expected], plane, |t, tile| {
        let k = own[2].0 + t as i64;
        let dk = overflow(k, owned[2].0, owned[2].1);
        let mut local = 0;
        for ((j, i), value) in iproduct!(0..dims[1], 0..dims[0]).zip(tile.iter_mut()) {
            let dj = overflow(own[1].0 + j as i64, owned[1].0, owned[1].1);
            let di = overflow(own[0].0 + i as i64, owned[0].0, owned[0].1);
            if di.max(dj).max(dk) > 0 {
                *value |= bit;
                local += 1;
            }
        }
        marked.fetch_add(local, Ordering::Relaxed);
    });
    marked.into_inner()
}

/// Mark duplicate points of the point block `extent` against `canonical`.
///
/// `ghosts` holds one entry per point of `extent`, i fastest.
pub fn mark_duplicate_points(
    reducer: &ParallelReducer,
    extent: Extent,
    canonical: Extent,
    ghosts: &mut [u8],
) -> usize {
    mark_block(
        reducer,
        ghosts,
        axes(&extent),
        axes(&canonical),
        extent.point_dims(),
        PointGhost::DUPLICATE_POINT.bits(),
        point_overflow,
    )
}

/// Mark duplicate cells of the structured block `extent` against `canonical`.
///
/// `ghosts` holds one entry per cell of `extent`, i fastest. Degenerate axes
/// are widened by one on both extents so 1D and 2D blocks scan as 3D.
pub fn mark_duplicate_cells(
    reducer: &ParallelReducer,
    extent: Extent,
    canonical: Extent,
    ghosts: &mut [u8],
) -> usize {
    let mut own = axes(&extent);
    let mut owned = axes(&canonical);
    for a in 0..3 {
        if own[a].0 == own[a].1 {
            own[a].1 += 1;
            owned[a].1 += 1;
        }
    }
    let dims = own.map(|(lo, hi)| usize::try_from(hi - lo).unwrap_or(0));
    mark_block(
        reducer,
        ghosts,
        own,
        owned,
        dims,
        CellGhost::DUPLICATE_CELL.bits(),
        cell_overflow,
    )
}

/// Return the ghost array of `attrs`, creating a zeroed one with `tuples`
/// entries if absent. A reserved-name array with the wrong shape or type is
/// replaced.
pub(crate) fn ensure_ghost_array(attrs: &mut AttributeSet, tuples: usize) -> ArrayHandle {
    if let Some(existing) = attrs.array(GHOST_ARRAY_NAME) {
        let usable = {
            let a = existing.read();
            a.scalar_type() == ScalarType::U8 && a.components() == 1 && a.tuples() == tuples
        };
        if usable {
            return existing;
        }
        log::warn!(
            "replacing malformed {} ghost array ({} tuples expected)",
            attrs.kind().as_str(),
            tuples
        );
    }
    attrs.add_array(new_ghost_array(tuples))
}

/// Marks duplicate points and cells of structured sub-blocks.
#[derive(Debug, Clone, Copy)]
pub struct GhostClassifier<'r> {
    reducer: &'r ParallelReducer,
}

impl<'r> GhostClassifier<'r> {
    pub fn new(reducer: &'r ParallelReducer) -> Self {
        Self { reducer }
    }

    /// Classify the block `extent` against `canonical`, writing into the
    /// ghost arrays of `points` and `cells`.
    ///
    /// No-op when the extents are equal. Arrays are created on first use and
    /// existing bits are preserved.
    pub fn classify(
        &self,
        extent: Extent,
        canonical: Extent,
        cells_only: bool,
        points: &mut AttributeSet,
        cells: &mut AttributeSet,
    ) -> GhostClassification {
        if extent == canonical {
            log::trace!("ghost classification skipped: extent {extent} is canonical");
            return GhostClassification::default();
        }
        let mut out = GhostClassification::default();

        if !cells_only {
            let handle = ensure_ghost_array(points, extent.point_count());
            let mut array = handle.write();
            if let Ok(bits) = array.as_mut_slice::<u8>() {
                out.duplicate_points = mark_duplicate_points(self.reducer, extent, canonical, bits);
            }
        }

        let handle = ensure_ghost_array(cells, extent.cell_count());
        let mut array = handle.write();
        if let Ok(bits) = array.as_mut_slice::<u8>() {
            out.duplicate_cells = mark_duplicate_cells(self.reducer, extent, canonical, bits);
        }

        log::debug!(
            "ghost classification of {extent} against {canonical}: {} points, {} cells",
            out.duplicate_points,
            out.duplicate_cells
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_rules() {
        assert_eq!(point_overflow(0, 1, 3), 1);
        assert_eq!(point_overflow(3, 1, 3), 0);
        assert_eq!(point_overflow(4, 1, 3), 2);
        assert_eq!(cell_overflow(2, 1, 3), 0);
        assert_eq!(cell_overflow(3, 1, 3), 1);
    }

    #[test]
    fn border_points_of_padded_tile() {
        let extent = Extent([0, 4, 0, 4, 0, 0]);
        let canonical = Extent([1, 3, 1, 3, 0, 0]);
        let mut bits = vec![0u8; 25];
        let n = mark_duplicate_points(&ParallelReducer::serial(), extent, canonical, &mut bits);
        assert_eq!(n, 16);
        for (idx, b) in bits.iter().enumerate() {
            let (i, j) = (idx % 5, idx / 5);
            let interior = (1..=3).contains(&i) && (1..=3).contains(&j);
            assert_eq!(*b == 0, interior, "point ({i}, {j})");
        }
    }

    #[test]
    fn cells_of_flat_tile() {
        let extent = Extent([0, 4, 0, 4, 0, 0]);
        let canonical = Extent([1, 3, 1, 3, 0, 0]);
        let mut bits = vec![0u8; 16];
        let n = mark_duplicate_cells(&ParallelReducer::serial(), extent, canonical, &mut bits);
        assert_eq!(n, 12);
        let clean: Vec<usize> = (0..16).filter(|&c| bits[c] == 0).collect();
        assert_eq!(clean, vec![5, 6, 9, 10]);
    }

    #[test]
    fn short_buffer_is_left_alone() {
        let mut bits = vec![0u8; 3];
        let n = mark_duplicate_points(
            &ParallelReducer::serial(),
            Extent([0, 4, 0, 0, 0, 0]),
            Extent([1, 2, 0, 0, 0, 0]),
            &mut bits,
        );
        assert_eq!(n, 0);
        assert_eq!(bits, vec![0; 3]);
    }
}
