//! Human-readable dataset description.

use crate::geometry::bounds::Bounds;
use std::fmt;

/// Counts, arrays and bounds of a dataset at one point in time.
///
/// Arrays are listed as `(name, components, tuples)` in insertion order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetSummary {
    pub points: usize,
    pub cells: usize,
    pub bounds: Bounds,
    /// Clock value the bounds were computed against.
    pub compute_time: u64,
    pub point_arrays: Vec<(String, usize, usize)>,
    pub cell_arrays: Vec<(String, usize, usize)>,
    pub field_arrays: Vec<(String, usize, usize)>,
}

fn write_arrays(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    arrays: &[(String, usize, usize)],
) -> fmt::Result {
    writeln!(f, "{label}: {} arrays", arrays.len())?;
    for (name, components, tuples) in arrays {
        writeln!(f, "  {name}: {components} components, {tuples} tuples")?;
    }
    Ok(())
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of points: {}", self.points)?;
        writeln!(f, "Number of cells: {}", self.cells)?;
        write_arrays(f, "Point data", &self.point_arrays)?;
        write_arrays(f, "Cell data", &self.cell_arrays)?;
        write_arrays(f, "Field data", &self.field_arrays)?;
        writeln!(f, "Bounds: {}", self.bounds)?;
        write!(f, "Compute time: {}", self.compute_time)
    }
}
