//! Attribute data: typed arrays, attribute sets and ghost status bits.

pub mod array;
pub mod attributes;
pub mod ghost;

pub use array::{ArrayBuffer, ArrayHandle, ArrayScalar, DataArray, ScalarType};
pub use attributes::{AttributeKind, AttributeSet};
pub use ghost::{CellGhost, GHOST_ARRAY_NAME, PointGhost};
