//! Order and rational-weight configuration for higher-order cells.
//!
//! Higher-order cells read their polynomial degrees from the cell array
//! [`HIGHER_ORDER_DEGREES`] (one 3-component tuple per cell) and, for Bezier
//! cells, their rational weights from the point array [`RATIONAL_WEIGHTS`].
//! Without a degree array a cell infers a uniform order from its point count.

use crate::data::array::DataArray;
use crate::mesh_error::MeshDatasetError;
use crate::topology::cell_type::CellType;
use num_traits::ToPrimitive;

/// Reserved cell array holding per-cell polynomial degrees.
pub const HIGHER_ORDER_DEGREES: &str = "HigherOrderDegrees";

/// Reserved point array holding Bezier rational weights.
pub const RATIONAL_WEIGHTS: &str = "RationalWeights";

/// Capability of a cell whose shape functions depend on a polynomial order.
pub trait HigherOrderCell {
    /// Set per-axis orders. `num_points` disambiguates wedges, whose point
    /// count depends on whether the triangular face is complete.
    fn set_order(&mut self, degrees: [usize; 3], num_points: usize);

    /// Infer a uniform order from the number of cell points.
    fn set_uniform_order_from_num_points(&mut self, num_points: usize);

    /// Replace the rational weights, one per cell point. An empty slice
    /// makes the cell polynomial.
    fn set_rational_weights(&mut self, weights: &[f64]);
}

fn degrees_of(array: &DataArray, cell_id: usize) -> Result<[usize; 3], MeshDatasetError> {
    let tuple = array.tuple(cell_id)?;
    Ok(std::array::from_fn(|a| {
        tuple.get(a).and_then(|d| d.to_usize()).unwrap_or(0)
    }))
}

/// Configure `cell` (cell `cell_id`, type `cell_type`, points `point_ids`).
///
/// Lagrange and tensor-product Bezier cells get their order from `degrees`
/// or, when absent, from the point count. Every Bezier cell gets its
/// weights gathered from `weights`, or an empty weight set when absent.
/// Linear cell types are left untouched.
pub fn configure_cell_order(
    cell_id: usize,
    cell_type: CellType,
    point_ids: &[usize],
    degrees: Option<&DataArray>,
    weights: Option<&DataArray>,
    cell: &mut dyn HigherOrderCell,
) -> Result<(), MeshDatasetError> {
    let num_points = point_ids.len();
    let takes_order = matches!(
        cell_type,
        CellType::LagrangeQuadrilateral
            | CellType::LagrangeHexahedron
            | CellType::LagrangeWedge
            | CellType::BezierQuadrilateral
            | CellType::BezierHexahedron
            | CellType::BezierWedge
    );
    if takes_order {
        match degrees {
            Some(array) => cell.set_order(degrees_of(array, cell_id)?, num_points),
            None => cell.set_uniform_order_from_num_points(num_points),
        }
    }

    if cell_type.is_rational() {
        match weights {
            Some(array) => {
                let w = point_ids
                    .iter()
                    .map(|&p| array.component(p, 0))
                    .collect::<Result<Vec<_>, _>>()?;
                cell.set_rational_weights(&w);
            }
            None => cell.set_rational_weights(&[]),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        order: Option<([usize; 3], usize)>,
        uniform: Option<usize>,
        weights: Option<Vec<f64>>,
    }

    impl HigherOrderCell for Recorder {
        fn set_order(&mut self, degrees: [usize; 3], num_points: usize) {
            self.order = Some((degrees, num_points));
        }
        fn set_uniform_order_from_num_points(&mut self, num_points: usize) {
            self.uniform = Some(num_points);
        }
        fn set_rational_weights(&mut self, weights: &[f64]) {
            self.weights = Some(weights.to_vec());
        }
    }

    #[test]
    fn lagrange_reads_degrees() {
        let degs = DataArray::from_values(HIGHER_ORDER_DEGREES, 3, vec![1.0, 1.0, 1.0, 2.0, 3.0, 1.0])
            .unwrap();
        let mut cell = Recorder::default();
        configure_cell_order(1, CellType::LagrangeHexahedron, &[0; 8], Some(&degs), None, &mut cell)
            .unwrap();
        assert_eq!(cell.order, Some(([2, 3, 1], 8)));
        assert!(cell.weights.is_none());
    }

    #[test]
    fn bezier_without_arrays() {
        let mut cell = Recorder::default();
        configure_cell_order(0, CellType::BezierQuadrilateral, &[0; 9], None, None, &mut cell)
            .unwrap();
        assert_eq!(cell.uniform, Some(9));
        assert_eq!(cell.weights, Some(vec![]));
    }

    #[test]
    fn bezier_triangle_gathers_weights_only() {
        let w = DataArray::single_component(RATIONAL_WEIGHTS, vec![1.0, 0.5, 0.25, 2.0]);
        let mut cell = Recorder::default();
        configure_cell_order(0, CellType::BezierTriangle, &[3, 1, 2], None, Some(&w), &mut cell)
            .unwrap();
        assert!(cell.order.is_none() && cell.uniform.is_none());
        assert_eq!(cell.weights, Some(vec![2.0, 0.5, 0.25]));
    }

    #[test]
    fn missing_weight_tuple_is_an_error() {
        let w = DataArray::single_component(RATIONAL_WEIGHTS, vec![1.0]);
        let mut cell = Recorder::default();
        let err = configure_cell_order(0, CellType::BezierCurve, &[0, 5], None, Some(&w), &mut cell);
        assert!(matches!(err, Err(MeshDatasetError::TupleOutOfRange { .. })));
    }

    #[test]
    fn linear_cells_untouched() {
        let mut cell = Recorder::default();
        configure_cell_order(0, CellType::Hexahedron, &[0; 8], None, None, &mut cell).unwrap();
        assert!(cell.order.is_none() && cell.uniform.is_none() && cell.weights.is_none());
    }
}
