#![allow(dead_code)]
use mesh_dataset::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Explicit points with optional explicit cells. Counts coordinate reads.
pub struct PointCloud {
    pts: Vec<[f64; 3]>,
    cells: Vec<(CellType, Vec<usize>)>,
    clock: ModificationClock,
    reads: AtomicUsize,
    core: DatasetCore,
}

impl PointCloud {
    pub fn new(pts: Vec<[f64; 3]>) -> Self {
        Self::with_reducer(pts, ParallelReducer::default())
    }

    pub fn with_reducer(pts: Vec<[f64; 3]>, reducer: ParallelReducer) -> Self {
        Self {
            pts,
            cells: Vec::new(),
            clock: ModificationClock::new(),
            reads: AtomicUsize::new(0),
            core: DatasetCore::new().with_reducer(reducer),
        }
    }

    pub fn set_point(&mut self, i: usize, p: [f64; 3]) {
        self.pts[i] = p;
        self.clock.modified();
    }

    pub fn push_cell(&mut self, ty: CellType, pts: Vec<usize>) {
        self.cells.push((ty, pts));
        self.clock.modified();
    }

    /// Coordinate reads since construction.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl DatasetSource for PointCloud {
    fn number_of_points(&self) -> usize {
        self.pts.len()
    }
    fn point(&self, i: usize) -> [f64; 3] {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.pts[i]
    }
    fn number_of_cells(&self) -> usize {
        self.cells.len()
    }
    fn cell_points(&self, cell: usize, out: &mut Vec<usize>) {
        out.clear();
        out.extend_from_slice(&self.cells[cell].1);
    }
    fn cell_type(&self, cell: usize) -> CellType {
        self.cells[cell].0
    }
    fn source_mtime(&self) -> u64 {
        self.clock.get()
    }
}

impl DataSet for PointCloud {
    fn core(&self) -> &DatasetCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut DatasetCore {
        &mut self.core
    }
}

/// Axis-aligned grid of unit spacing over an index extent.
pub struct UniformGrid {
    extent: Extent,
    clock: ModificationClock,
    core: DatasetCore,
}

impl UniformGrid {
    pub fn new(extent: Extent) -> Self {
        Self::with_reducer(extent, ParallelReducer::serial())
    }

    pub fn with_reducer(extent: Extent, reducer: ParallelReducer) -> Self {
        Self {
            extent,
            clock: ModificationClock::new(),
            core: DatasetCore::new().with_reducer(reducer),
        }
    }

    /// Index triple of point `i`, i fastest.
    pub fn ijk(&self, i: usize) -> [usize; 3] {
        let d = self.extent.point_dims();
        [i % d[0], (i / d[0]) % d[1], i / (d[0] * d[1])]
    }

    fn point_id(&self, ijk: [usize; 3]) -> usize {
        let d = self.extent.point_dims();
        ijk[0] + d[0] * (ijk[1] + d[1] * ijk[2])
    }
}

impl DatasetSource for UniformGrid {
    fn number_of_points(&self) -> usize {
        self.extent.point_count()
    }
    fn point(&self, i: usize) -> [f64; 3] {
        let ijk = self.ijk(i);
        std::array::from_fn(|a| f64::from(self.extent.lo(a)) + ijk[a] as f64)
    }
    fn number_of_cells(&self) -> usize {
        self.extent.cell_count()
    }
    fn cell_points(&self, cell: usize, out: &mut Vec<usize>) {
        out.clear();
        let pd = self.extent.point_dims();
        let cd = self.extent.cell_dims();
        let c = [cell % cd[0], (cell / cd[0]) % cd[1], cell / (cd[0] * cd[1])];
        let offsets = |a: usize| if pd[a] > 1 { 0..2 } else { 0..1 };
        for dk in offsets(2) {
            for dj in offsets(1) {
                for di in offsets(0) {
                    out.push(self.point_id([c[0] + di, c[1] + dj, c[2] + dk]));
                }
            }
        }
    }
    fn cell_type(&self, _cell: usize) -> CellType {
        match self.extent.dimension() {
            0 => CellType::Vertex,
            1 => CellType::Segment,
            2 => CellType::Quadrilateral,
            _ => CellType::Hexahedron,
        }
    }
    fn source_mtime(&self) -> u64 {
        self.clock.get()
    }
    fn structured_extent(&self) -> Option<Extent> {
        Some(self.extent)
    }
}

impl DataSet for UniformGrid {
    fn core(&self) -> &DatasetCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut DatasetCore {
        &mut self.core
    }
}

/// Reproducible random points in `[-scale, scale]^3`.
pub fn random_cloud(n: usize, scale: f64, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|_| std::array::from_fn(|_| rng.gen_range(-scale..=scale)))
        .collect()
}

/// Reducer with a dedicated pool and small chunks, so tests split work.
pub fn pooled(threads: usize) -> ParallelReducer {
    ParallelReducer::new(ReducerConfig {
        num_threads: Some(threads),
        min_chunk_len: 16,
        chunks_per_worker: 4,
    })
    .expect("thread pool")
}

/// Values of the ghost array of `kind`, or `None` if absent.
pub fn ghost_bits<D: DataSet>(ds: &D, kind: AttributeKind) -> Option<Vec<u8>> {
    ds.core()
        .ghost_array(kind)
        .map(|h| h.read().as_slice::<u8>().expect("u8 ghosts").to_vec())
}
