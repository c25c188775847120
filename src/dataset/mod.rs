//! Point-and-cell datasets.
//!
//! A concrete dataset owns its point coordinates and cell connectivity and
//! exposes them through [`DatasetSource`]. It embeds a [`DatasetCore`] holding
//! its attribute sets and derived caches, and gets the caller-facing queries
//! for free by implementing [`DataSet`].
//!
//! ```ignore
//! struct Cloud { pts: Vec<[f64; 3]>, clock: ModificationClock, core: DatasetCore }
//!
//! impl DatasetSource for Cloud { /* accessors */ }
//! impl DataSet for Cloud {
//!     fn core(&self) -> &DatasetCore { &self.core }
//!     fn core_mut(&mut self) -> &mut DatasetCore { &mut self.core }
//! }
//!
//! let b = cloud.bounds();
//! ```

pub mod base;
pub mod summary;
pub mod validation;

pub use base::DatasetCore;
pub use summary::DatasetSummary;
pub use validation::{AttributeIssue, AttributeReport, AttributeValidity, Severity};

use crate::algs::ghost_classify::GhostClassification;
use crate::geometry::bounds::Bounds;
use crate::geometry::scalar_range::ScalarRange;
use crate::topology::cell_type::CellType;
use crate::topology::extent::Extent;

/// Geometry and topology accessors supplied by a concrete dataset.
///
/// Accessors are called concurrently from reduction workers, so
/// implementations must be `Sync` and must not mutate through `&self`
/// (interior counters aside).
pub trait DatasetSource: Sync {
    /// Number of points.
    fn number_of_points(&self) -> usize;

    /// Coordinates of point `i`, for `i < number_of_points()`.
    fn point(&self, i: usize) -> [f64; 3];

    /// Number of cells.
    fn number_of_cells(&self) -> usize;

    /// Replace `out` with the point ids of `cell`, in cell order.
    fn cell_points(&self, cell: usize, out: &mut Vec<usize>);

    /// Type tag of `cell`.
    fn cell_type(&self, cell: usize) -> CellType;

    /// Modification time of the coordinates and connectivity.
    fn source_mtime(&self) -> u64;

    /// Storage extent of a structured dataset; `None` for unstructured data.
    ///
    /// There is no matching accessor for the canonical (owned) extent. That
    /// extent belongs to the decomposition that carved the block, not to the
    /// block's storage, so it is passed to
    /// [`DataSet::generate_ghost_arrays`] by the caller.
    fn structured_extent(&self) -> Option<Extent> {
        None
    }

    /// Replace `out` with the ids of every cell using `point`.
    ///
    /// The default scans all cells; datasets with upward links should
    /// override it.
    fn point_cells(&self, point: usize, out: &mut Vec<usize>) {
        out.clear();
        let mut pts = Vec::new();
        for cell in 0..self.number_of_cells() {
            self.cell_points(cell, &mut pts);
            if pts.contains(&point) {
                out.push(cell);
            }
        }
    }
}

/// Caller-facing dataset queries, provided on top of [`DatasetSource`].
pub trait DataSet: DatasetSource {
    fn core(&self) -> &DatasetCore;
    fn core_mut(&mut self) -> &mut DatasetCore;

    /// Aggregate modification time of geometry, topology and attributes.
    fn mtime(&self) -> u64 {
        self.core().mtime(self)
    }

    /// Bounding box, recomputed only when stale.
    fn bounds(&self) -> Bounds {
        self.core().bounds(self)
    }

    fn center(&self) -> [f64; 3] {
        self.core().center(self)
    }

    fn length(&self) -> f64 {
        self.core().length(self)
    }

    fn length2(&self) -> f64 {
        self.core().length2(self)
    }

    /// Combined ghost-excluded range of the active point and cell scalars.
    fn scalar_range(&self) -> ScalarRange {
        self.core().scalar_range(self)
    }

    fn has_any_ghost_points(&self) -> bool {
        self.core().has_any_ghost_points()
    }

    fn has_any_ghost_cells(&self) -> bool {
        self.core().has_any_ghost_cells()
    }

    /// Mark duplicate points and cells of a structured dataset against the
    /// extent it owns. No-op for unstructured datasets.
    fn generate_ghost_arrays(&mut self, canonical: Extent, cells_only: bool) -> GhostClassification {
        let extent = self.structured_extent();
        self.core_mut()
            .generate_ghost_arrays(extent, canonical, cells_only)
    }

    /// Compare attribute tuple counts with point and cell counts.
    fn check_attribute_consistency(&self) -> AttributeReport {
        self.core().check_attribute_consistency(self)
    }

    /// Distinct cell types in first-seen order.
    fn cell_types(&self) -> Vec<CellType> {
        self.core().cell_types(self)
    }

    fn cell_bounds(&self, cell: usize) -> Bounds {
        self.core().cell_bounds(self, cell)
    }

    /// Cells other than `cell` that use every point in `point_ids`.
    fn cell_neighbors(&self, cell: usize, point_ids: &[usize]) -> Vec<usize> {
        self.core().cell_neighbors(self, cell, point_ids)
    }

    fn summary(&self) -> DatasetSummary {
        self.core().summary(self)
    }
}
