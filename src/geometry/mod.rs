//! Geometric summaries derived from point coordinates and attributes.
//!
//! Both summaries are cached and stamped with the aggregate modification time
//! of their inputs; see [`crate::clock`].

pub mod bounds;
pub mod scalar_range;

pub use bounds::{Bounds, GeometryCache, compute_bounds};
pub use scalar_range::{ScalarRange, ScalarRangeCache};
