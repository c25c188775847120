//! Attribute ownership and cached geometric summaries shared by every dataset.

use crate::algs::ghost_classify::{GhostClassification, GhostClassifier};
use crate::algs::reduce::ParallelReducer;
use crate::clock::{InvalidateCache, ModificationClock};
use crate::data::array::ArrayHandle;
use crate::data::attributes::{AttributeKind, AttributeSet, new_ghost_array};
use crate::data::ghost::{CellGhost, PointGhost};
use crate::dataset::DatasetSource;
use crate::dataset::summary::DatasetSummary;
use crate::dataset::validation::{AttributeReport, check_attribute_sizes};
use crate::debug_invariants::{DebugInvariants, InvariantViolation};
use crate::geometry::bounds::{Bounds, GeometryCache, compute_bounds};
use crate::geometry::scalar_range::{
    ScalarRange, ScalarRangeCache, attribute_scalar_range, combine_ranges,
};
use crate::mesh_error::MeshDatasetError;
use crate::topology::cell_type::CellType;
use crate::topology::extent::Extent;
use crate::topology::higher_order::{
    HIGHER_ORDER_DEGREES, HigherOrderCell, RATIONAL_WEIGHTS, configure_cell_order,
};
use itertools::Itertools;
use parking_lot::RwLock;

/// Attribute sets and derived caches of one dataset.
///
/// The core never owns geometry: every query that needs coordinates or
/// connectivity takes the owning dataset as a [`DatasetSource`].
#[derive(Debug)]
pub struct DatasetCore {
    clock: ModificationClock,
    point_data: AttributeSet,
    cell_data: AttributeSet,
    field_data: AttributeSet,
    geometry: RwLock<GeometryCache>,
    scalar_range: RwLock<ScalarRangeCache>,
    reducer: ParallelReducer,
}

static_assertions::assert_impl_all!(DatasetCore: Send, Sync);

impl Default for DatasetCore {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetCore {
    /// Empty core using the process-wide reducer.
    pub fn new() -> Self {
        Self {
            clock: ModificationClock::new(),
            point_data: AttributeSet::new(AttributeKind::Point),
            cell_data: AttributeSet::new(AttributeKind::Cell),
            field_data: AttributeSet::new(AttributeKind::Field),
            geometry: RwLock::new(GeometryCache::default()),
            scalar_range: RwLock::new(ScalarRangeCache::default()),
            reducer: ParallelReducer::default(),
        }
    }

    /// Use `reducer` for every reduction issued by this core.
    pub fn with_reducer(mut self, reducer: ParallelReducer) -> Self {
        self.reducer = reducer;
        self
    }

    pub fn reducer(&self) -> &ParallelReducer {
        &self.reducer
    }

    // ------------------------------------------------------------------
    // clocks
    // ------------------------------------------------------------------

    /// Advance the dataset-level clock.
    pub fn modified(&self) {
        self.clock.modified();
    }

    /// `max` of the source clock, the dataset clock and both attribute clocks.
    pub fn mtime<S: DatasetSource + ?Sized>(&self, src: &S) -> u64 {
        src.source_mtime()
            .max(self.clock.get())
            .max(self.point_data.mtime())
            .max(self.cell_data.mtime())
    }

    // ------------------------------------------------------------------
    // attributes
    // ------------------------------------------------------------------

    pub fn point_data(&self) -> &AttributeSet {
        &self.point_data
    }

    pub fn point_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.point_data
    }

    pub fn cell_data(&self) -> &AttributeSet {
        &self.cell_data
    }

    pub fn cell_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.cell_data
    }

    /// Dataset-level arrays, not tied to points or cells.
    pub fn field_data(&self) -> &AttributeSet {
        &self.field_data
    }

    pub fn field_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.field_data
    }

    /// Attribute set for `kind`.
    pub fn attributes(&self, kind: AttributeKind) -> &AttributeSet {
        match kind {
            AttributeKind::Point => &self.point_data,
            AttributeKind::Cell => &self.cell_data,
            AttributeKind::Field => &self.field_data,
        }
    }

    pub fn attributes_mut(&mut self, kind: AttributeKind) -> &mut AttributeSet {
        match kind {
            AttributeKind::Point => &mut self.point_data,
            AttributeKind::Cell => &mut self.cell_data,
            AttributeKind::Field => &mut self.field_data,
        }
    }

    /// Make the array `name` of the `kind` set its active scalars.
    pub fn set_active_scalars(&mut self, kind: AttributeKind, name: &str) -> Result<(), MeshDatasetError> {
        let attrs = self.attributes_mut(kind);
        if attrs.array(name).is_none() {
            return Err(MeshDatasetError::MissingArray(name.to_owned()));
        }
        attrs.set_active_scalars(Some(name));
        Ok(())
    }

    /// Number of elements `kind` attributes describe. Field data reports the
    /// tuple count of its first array.
    pub fn number_of_elements<S: DatasetSource + ?Sized>(&self, kind: AttributeKind, src: &S) -> usize {
        match kind {
            AttributeKind::Point => src.number_of_points(),
            AttributeKind::Cell => src.number_of_cells(),
            AttributeKind::Field => self
                .field_data
                .array_at(0)
                .map_or(0, |h| h.read().tuples()),
        }
    }

    /// Drop all point and cell arrays. The dataset clock is left alone.
    pub fn initialize(&mut self) {
        self.point_data.initialize();
        self.cell_data.initialize();
    }

    /// Share every point, cell and field array of `from`.
    pub fn copy_attributes(&mut self, from: &DatasetCore) {
        self.point_data.pass_data(&from.point_data);
        self.cell_data.pass_data(&from.cell_data);
        self.field_data.pass_data(&from.field_data);
    }

    /// Copy cached values from `src`, and share its attribute arrays.
    pub fn shallow_copy_from(&mut self, src: &DatasetCore) {
        self.copy_caches(src);
        self.point_data.shallow_copy(&src.point_data);
        self.cell_data.shallow_copy(&src.cell_data);
        self.field_data.shallow_copy(&src.field_data);
    }

    /// Copy cached values from `src`, and duplicate its attribute arrays.
    pub fn deep_copy_from(&mut self, src: &DatasetCore) {
        self.copy_caches(src);
        self.point_data.deep_copy(&src.point_data);
        self.cell_data.deep_copy(&src.cell_data);
        self.field_data.deep_copy(&src.field_data);
    }

    fn copy_caches(&mut self, src: &DatasetCore) {
        *self.geometry.get_mut() = *src.geometry.read();
        *self.scalar_range.get_mut() = *src.scalar_range.read();
    }

    /// Bytes held by this core and its attribute arrays.
    pub fn actual_memory_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.point_data.actual_memory_size()
            + self.cell_data.actual_memory_size()
            + self.field_data.actual_memory_size()
    }

    /// Release spare capacity held by point and cell arrays.
    pub fn squeeze(&mut self) {
        self.point_data.squeeze();
        self.cell_data.squeeze();
    }

    // ------------------------------------------------------------------
    // geometry
    // ------------------------------------------------------------------

    /// Bounding box of `src`'s points.
    ///
    /// Served from cache while no input clock has advanced past the cache
    /// stamp. On a miss the bounds are recomputed against a clock snapshot;
    /// if an input changes during the reduction the result is discarded and
    /// the reduction runs again.
    pub fn bounds<S: DatasetSource + ?Sized>(&self, src: &S) -> Bounds {
        loop {
            let snapshot = self.mtime(src);
            if let Some(b) = self.geometry.read().lookup(snapshot) {
                return b;
            }
            let n = src.number_of_points();
            log::trace!("recomputing bounds over {n} points at time {snapshot}");
            let b = compute_bounds(&self.reducer, n, |i| src.point(i));
            if self.mtime(src) == snapshot {
                self.geometry.write().store(b, snapshot);
                self.debug_assert_invariants();
                return b;
            }
            log::debug!("inputs changed while computing bounds, retrying");
        }
    }

    pub fn center<S: DatasetSource + ?Sized>(&self, src: &S) -> [f64; 3] {
        self.bounds(src).center()
    }

    /// Diagonal length; zero without points.
    pub fn length<S: DatasetSource + ?Sized>(&self, src: &S) -> f64 {
        self.bounds(src).length()
    }

    pub fn length2<S: DatasetSource + ?Sized>(&self, src: &S) -> f64 {
        self.bounds(src).length2()
    }

    /// Last computed bounds, without a freshness check.
    pub fn cached_bounds(&self) -> Bounds {
        self.geometry.read().bounds()
    }

    /// Combined ghost-excluded range of the active point and cell scalars.
    pub fn scalar_range<S: DatasetSource + ?Sized>(&self, src: &S) -> ScalarRange {
        loop {
            let snapshot = self.mtime(src);
            if let Some(r) = self.scalar_range.read().lookup(snapshot) {
                return r;
            }
            log::trace!("recomputing scalar range at time {snapshot}");
            let r = combine_ranges(
                attribute_scalar_range(&self.reducer, &self.point_data),
                attribute_scalar_range(&self.reducer, &self.cell_data),
            );
            if self.mtime(src) == snapshot {
                self.scalar_range.write().store(r, snapshot);
                self.debug_assert_invariants();
                return r;
            }
        }
    }

    /// Last computed scalar range, without a freshness check.
    pub fn cached_scalar_range(&self) -> ScalarRange {
        self.scalar_range.read().range()
    }

    // ------------------------------------------------------------------
    // ghosts
    // ------------------------------------------------------------------

    /// Ghost status array for points or cells.
    ///
    /// Field data has no ghost array; asking for it logs an error and
    /// yields `None`.
    pub fn ghost_array(&self, kind: AttributeKind) -> Option<ArrayHandle> {
        match self.try_ghost_array(kind) {
            Ok(h) => h,
            Err(e) => {
                log::error!("{e}");
                None
            }
        }
    }

    /// Ghost status array for points or cells, or
    /// [`MeshDatasetError::InvalidAttributeType`] for field data.
    pub fn try_ghost_array(&self, kind: AttributeKind) -> Result<Option<ArrayHandle>, MeshDatasetError> {
        match kind {
            AttributeKind::Point => Ok(self.point_data.ghost_array()),
            AttributeKind::Cell => Ok(self.cell_data.ghost_array()),
            AttributeKind::Field => Err(MeshDatasetError::InvalidAttributeType(kind)),
        }
    }

    /// Point ghost array, created zero-filled if absent.
    pub fn allocate_point_ghost_array<S: DatasetSource + ?Sized>(&mut self, src: &S) -> ArrayHandle {
        match self.point_data.ghost_array() {
            Some(h) => h,
            None => self.point_data.add_array(new_ghost_array(src.number_of_points())),
        }
    }

    /// Cell ghost array, created zero-filled if absent.
    pub fn allocate_cell_ghost_array<S: DatasetSource + ?Sized>(&mut self, src: &S) -> ArrayHandle {
        match self.cell_data.ghost_array() {
            Some(h) => h,
            None => self.cell_data.add_array(new_ghost_array(src.number_of_cells())),
        }
    }

    /// Whether any entry of the `kind` ghost array intersects `mask`.
    /// `false` without a ghost array.
    pub fn any_ghost_bit(&self, kind: AttributeKind, mask: u8) -> bool {
        let Some(handle) = self.ghost_array(kind) else {
            return false;
        };
        let array = handle.read();
        let Ok(bits) = array.as_slice::<u8>() else {
            return false;
        };
        self.reducer.any(bits.len(), |i| bits[i] & mask != 0)
    }

    pub fn has_any_ghost_points(&self) -> bool {
        self.any_ghost_bit(AttributeKind::Point, PointGhost::DUPLICATE_POINT.bits())
    }

    pub fn has_any_ghost_cells(&self) -> bool {
        self.any_ghost_bit(AttributeKind::Cell, CellGhost::DUPLICATE_CELL.bits())
    }

    /// Mark duplicates of the structured block `extent` against `canonical`.
    ///
    /// `extent` is `None` for unstructured datasets, which are left alone.
    pub fn generate_ghost_arrays(
        &mut self,
        extent: Option<Extent>,
        canonical: Extent,
        cells_only: bool,
    ) -> GhostClassification {
        let Some(extent) = extent else {
            log::trace!("ghost generation skipped for unstructured dataset");
            return GhostClassification::default();
        };
        GhostClassifier::new(&self.reducer).classify(
            extent,
            canonical,
            cells_only,
            &mut self.point_data,
            &mut self.cell_data,
        )
    }

    // ------------------------------------------------------------------
    // validation
    // ------------------------------------------------------------------

    /// Compare every point and cell array with the element counts of `src`.
    pub fn check_attribute_consistency<S: DatasetSource + ?Sized>(&self, src: &S) -> AttributeReport {
        let mut report = AttributeReport::consistent();
        check_attribute_sizes(&self.point_data, || src.number_of_points(), &mut report);
        check_attribute_sizes(&self.cell_data, || src.number_of_cells(), &mut report);
        report
    }

    // ------------------------------------------------------------------
    // cells
    // ------------------------------------------------------------------

    /// Distinct cell types in first-seen order.
    pub fn cell_types<S: DatasetSource + ?Sized>(&self, src: &S) -> Vec<CellType> {
        (0..src.number_of_cells())
            .map(|c| src.cell_type(c))
            .unique()
            .collect()
    }

    /// Bounds of the points of `cell`.
    pub fn cell_bounds<S: DatasetSource + ?Sized>(&self, src: &S, cell: usize) -> Bounds {
        let mut pts = Vec::new();
        src.cell_points(cell, &mut pts);
        if pts.is_empty() {
            return Bounds::UNINITIALIZED;
        }
        pts.iter().fold(Bounds::EMPTY, |mut b, &p| {
            b.add_point(src.point(p));
            b
        })
    }

    /// Number of points of `cell`.
    pub fn cell_size<S: DatasetSource + ?Sized>(&self, src: &S, cell: usize) -> usize {
        let mut pts = Vec::new();
        src.cell_points(cell, &mut pts);
        pts.len()
    }

    /// Cells other than `cell` that use every point in `point_ids`.
    pub fn cell_neighbors<S: DatasetSource + ?Sized>(
        &self,
        src: &S,
        cell: usize,
        point_ids: &[usize],
    ) -> Vec<usize> {
        let Some((&first, rest)) = point_ids.split_first() else {
            return Vec::new();
        };
        let mut candidates = Vec::new();
        src.point_cells(first, &mut candidates);
        candidates.retain(|&c| c != cell);
        let mut other = Vec::new();
        for &p in rest {
            if candidates.is_empty() {
                break;
            }
            src.point_cells(p, &mut other);
            candidates.retain(|c| other.contains(c));
        }
        candidates
    }

    /// Configure order and rational weights of a higher-order `cell` from
    /// the reserved degree and weight arrays.
    pub fn configure_cell_order(
        &self,
        cell_id: usize,
        cell_type: CellType,
        point_ids: &[usize],
        cell: &mut dyn HigherOrderCell,
    ) -> Result<(), MeshDatasetError> {
        let degrees = self.cell_data.array(HIGHER_ORDER_DEGREES);
        let weights = self.point_data.array(RATIONAL_WEIGHTS);
        let degrees = degrees.as_ref().map(|h| h.read());
        let weights = weights.as_ref().map(|h| h.read());
        configure_cell_order(
            cell_id,
            cell_type,
            point_ids,
            degrees.as_deref(),
            weights.as_deref(),
            cell,
        )
    }

    /// Snapshot of counts, arrays and bounds.
    pub fn summary<S: DatasetSource + ?Sized>(&self, src: &S) -> DatasetSummary {
        DatasetSummary {
            points: src.number_of_points(),
            cells: src.number_of_cells(),
            bounds: self.bounds(src),
            compute_time: self.geometry.read().stamp().get(),
            point_arrays: self.point_data.describe(),
            cell_arrays: self.cell_data.describe(),
            field_arrays: self.field_data.describe(),
        }
    }
}

impl InvalidateCache for DatasetCore {
    fn invalidate_cache(&mut self) {
        self.geometry.get_mut().clear();
        self.scalar_range.get_mut().clear();
    }
}

impl DebugInvariants for DatasetCore {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "DatasetCore");
    }

    fn validate_invariants(&self) -> Result<(), InvariantViolation> {
        let b = self.geometry.read().bounds();
        if b != Bounds::UNINITIALIZED {
            if let Some(axis) = (0..3).find(|&a| b.min(a) > b.max(a)) {
                return Err(InvariantViolation::InvertedBounds { axis });
            }
        }
        self.point_data.validate_invariants()?;
        self.cell_data.validate_invariants()?;
        self.field_data.validate_invariants()
    }
}
