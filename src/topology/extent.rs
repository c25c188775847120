//! Structured index extents.
//!
//! An [`Extent`] is `[imin, imax, jmin, jmax, kmin, kmax]` with inclusive
//! point bounds. An axis with `lo == hi` is degenerate (a 2D or 1D grid); an
//! axis with `lo > hi` makes the extent empty.

use std::fmt;

/// Inclusive 3D index extent of a structured dataset.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Extent(pub [i32; 6]);

impl Extent {
    /// An extent with no points.
    pub const EMPTY: Extent = Extent([0, -1, 0, -1, 0, -1]);

    /// Build from per-axis inclusive ranges.
    pub const fn new(i: (i32, i32), j: (i32, i32), k: (i32, i32)) -> Self {
        Extent([i.0, i.1, j.0, j.1, k.0, k.1])
    }

    /// Lower bound on `axis` (0 = i, 1 = j, 2 = k).
    #[inline]
    pub fn lo(&self, axis: usize) -> i32 {
        self.0[2 * axis]
    }

    /// Upper bound on `axis`.
    #[inline]
    pub fn hi(&self, axis: usize) -> i32 {
        self.0[2 * axis + 1]
    }

    /// Point dimensions per axis; zero on an empty axis.
    pub fn point_dims(&self) -> [usize; 3] {
        std::array::from_fn(|a| {
            let n = i64::from(self.hi(a)) - i64::from(self.lo(a)) + 1;
            usize::try_from(n.max(0)).unwrap_or(0)
        })
    }

    /// Return true if any axis has no points.
    pub fn is_empty(&self) -> bool {
        self.point_dims().contains(&0)
    }

    /// Number of points covered.
    pub fn point_count(&self) -> usize {
        self.point_dims().iter().product()
    }

    /// Number of cells covered. Degenerate axes contribute a factor of one,
    /// so a single-point extent has one (vertex) cell.
    pub fn cell_count(&self) -> usize {
        let dims = self.point_dims();
        if dims.contains(&0) {
            return 0;
        }
        dims.iter().map(|&d| if d > 1 { d - 1 } else { 1 }).product()
    }

    /// Cell dimensions per axis, with degenerate axes counted as one cell.
    pub fn cell_dims(&self) -> [usize; 3] {
        let dims = self.point_dims();
        if dims.contains(&0) {
            return [0; 3];
        }
        dims.map(|d| if d > 1 { d - 1 } else { 1 })
    }

    /// Number of non-degenerate axes.
    pub fn dimension(&self) -> usize {
        self.point_dims().iter().filter(|&&d| d > 1).count()
    }
}

impl Default for Extent {
    fn default() -> Self {
        Extent::EMPTY
    }
}

impl From<[i32; 6]> for Extent {
    fn from(e: [i32; 6]) -> Self {
        Extent(e)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.0;
        write!(
            f,
            "[{}..{}, {}..{}, {}..{}]",
            e[0], e[1], e[2], e[3], e[4], e[5]
        )
    }
}
