#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-dataset
//!
//! mesh-dataset is the attribute and geometry layer shared by point-and-cell
//! datasets in a visualization pipeline. Concrete datasets keep their own
//! coordinates and connectivity; this crate owns their per-point, per-cell and
//! field attributes and derives cached summaries from them.
//!
//! ## Features
//! - Typed attribute arrays and attribute sets with modification clocks
//! - Cached bounds, center, diagonal length and scalar range that are never
//!   served stale and never recomputed while fresh
//! - Fork/join reductions over points and cells on a rayon pool
//! - Ghost (duplicate) classification of padded structured sub-blocks
//! - Attribute size validation that reports instead of failing
//!
//! ## Caching
//!
//! Every mutable entity carries a [`clock::ModificationClock`] drawn from one
//! process-wide counter. A cached value records the aggregate clock it was
//! computed against and is reused only while no input clock has moved past
//! it. Writes through an [`data::ArrayHandle`] advance the array clock before
//! the write guard is handed out.
//!
//! ## Usage
//!
//! Implement [`dataset::DatasetSource`] for your point/cell storage, embed a
//! [`dataset::DatasetCore`] and implement [`dataset::DataSet`]:
//!
//! ```ignore
//! use mesh_dataset::prelude::*;
//!
//! let bounds = grid.bounds();
//! grid.generate_ghost_arrays(Extent([1, 3, 1, 3, 0, 0]), false);
//! assert!(grid.has_any_ghost_points());
//! ```

pub mod algs;
pub mod clock;
pub mod data;
pub mod dataset;
pub mod debug_invariants;
pub mod geometry;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use mesh_error::MeshDatasetError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::ghost_classify::{GhostClassification, GhostClassifier};
    pub use crate::algs::reduce::{ParallelReducer, ReducerConfig};
    pub use crate::clock::{CacheStamp, InvalidateCache, ModificationClock};
    pub use crate::data::array::{ArrayHandle, DataArray, ScalarType};
    pub use crate::data::attributes::{AttributeKind, AttributeSet};
    pub use crate::data::ghost::{CellGhost, GHOST_ARRAY_NAME, PointGhost};
    pub use crate::dataset::{
        AttributeReport, AttributeValidity, DataSet, DatasetCore, DatasetSource, DatasetSummary,
        Severity,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::bounds::Bounds;
    pub use crate::geometry::scalar_range::ScalarRange;
    pub use crate::mesh_error::MeshDatasetError;
    pub use crate::topology::cell_type::CellType;
    pub use crate::topology::extent::Extent;
    pub use crate::topology::higher_order::HigherOrderCell;
}
