use crate::mesh_error::MeshDatasetError;

/// Trait for validating cache and attribute invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return a description of the first violation.
    fn validate_invariants(&self) -> Result<(), InvariantViolation>;
}

/// A broken internal invariant, described for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// A cached bounding box has `min > max` on some axis.
    #[error("cached bounds inverted on axis {axis}")]
    InvertedBounds { axis: usize },
    /// A reserved ghost array is not a single-component `u8` array.
    #[error("ghost array in {0} attributes is not single-component u8")]
    MalformedGhostArray(&'static str),
    /// The name index of an attribute set disagrees with its arrays.
    #[error("attribute index out of sync for `{0}`")]
    StaleIndex(String),
    /// Error surfaced while checking.
    #[error(transparent)]
    Dataset(#[from] MeshDatasetError),
}

/// Helper macro to run a fallible check and panic on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
