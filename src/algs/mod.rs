//! Parallel algorithms over dataset elements.

pub mod ghost_classify;
pub mod reduce;

pub use ghost_classify::{GhostClassification, GhostClassifier};
pub use reduce::{ParallelReducer, ReducerConfig};
