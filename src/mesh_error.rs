//! MeshDatasetError: Unified error type for mesh-dataset public APIs
//!
//! Fallible constructors and typed accessors return this error. Diagnostic
//! queries (attribute consistency, bounds of empty datasets) report through
//! values and the `log` facade instead, so callers are never unwound.

use crate::data::array::ScalarType;
use crate::data::attributes::AttributeKind;
use thiserror::Error;

/// Unified error type for mesh-dataset operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshDatasetError {
    /// Ghost arrays and element counts only exist for point and cell attributes.
    #[error("invalid attribute type for ghost arrays: {0:?}")]
    InvalidAttributeType(AttributeKind),
    /// Typed access requested a scalar type the array does not store.
    #[error("array `{name}` stores {found:?}, requested {expected:?}")]
    ArrayTypeMismatch {
        name: String,
        expected: ScalarType,
        found: ScalarType,
    },
    /// Tuple index past the end of the array.
    #[error("tuple {index} out of range for array `{name}` with {len} tuples")]
    TupleOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },
    /// Component index past the array arity.
    #[error("component {component} out of range for array `{name}` with {components} components")]
    ComponentOutOfRange {
        name: String,
        component: usize,
        components: usize,
    },
    /// Flat value count is not a whole number of tuples.
    #[error("array `{name}`: {values} values is not a multiple of {components} components")]
    ArrayShapeMismatch {
        name: String,
        values: usize,
        components: usize,
    },
    /// Arrays need at least one component per tuple.
    #[error("array `{0}` must have at least one component")]
    ZeroComponents(String),
    /// No array registered under this name.
    #[error("no array named `{0}`")]
    MissingArray(String),
    /// A dedicated worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl From<rayon::ThreadPoolBuildError> for MeshDatasetError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        MeshDatasetError::ThreadPool(err.to_string())
    }
}
