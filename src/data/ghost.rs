//! Ghost status bits stored per point and per cell.
//!
//! Ghost status lives in a reserved single-component `u8` array named
//! [`GHOST_ARRAY_NAME`] inside the point or cell attribute set.

use bitflags::bitflags;

/// Reserved name of the per-element ghost status array.
pub const GHOST_ARRAY_NAME: &str = "GhostType";

bitflags! {
    /// Point ghost status bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct PointGhost: u8 {
        /// Point is owned by another sub-block.
        const DUPLICATE_POINT = 1;
        /// Point is hidden and skipped by range queries.
        const HIDDEN_POINT = 2;
    }
}

bitflags! {
    /// Cell ghost status bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct CellGhost: u8 {
        /// Cell is owned by another sub-block.
        const DUPLICATE_CELL = 1;
        const HIGH_CONNECTIVITY_CELL = 2;
        const LOW_CONNECTIVITY_CELL = 4;
        /// Cell has been refined and replaced by its children.
        const REFINED_CELL = 8;
        const EXTERIOR_CELL = 16;
        /// Cell is hidden and skipped by range queries.
        const HIDDEN_CELL = 32;
    }
}

impl PointGhost {
    /// Bits skipped by point range queries unless overridden.
    pub const DEFAULT_SKIP: PointGhost = PointGhost::HIDDEN_POINT;
}

impl CellGhost {
    /// Bits skipped by cell range queries unless overridden.
    pub const DEFAULT_SKIP: CellGhost = CellGhost::HIDDEN_CELL.union(CellGhost::REFINED_CELL);
}
