//! Cell and index-space descriptions read by datasets.
//!
//! Connectivity itself is owned by concrete datasets; this module only holds
//! the cell type tags, structured extents and the higher-order cell
//! configuration hook.

pub mod cell_type;
pub mod extent;
pub mod higher_order;

pub use cell_type::CellType;
pub use extent::Extent;
pub use higher_order::{HigherOrderCell, configure_cell_order};
