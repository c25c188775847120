//! Cell type tags reported by concrete datasets.

/// Cell kinds a dataset may report for its cells.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellType {
    /// Placeholder for a cell with no geometry.
    #[default]
    Empty,
    /// 0D vertex.
    Vertex,
    /// 1D segment/edge.
    Segment,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
    /// 3D wedge/prism.
    Prism,
    /// 3D pyramid.
    Pyramid,
    /// 2D polygon with `n` vertices.
    Polygon(u8),
    /// Generic polyhedron.
    Polyhedron,
    LagrangeQuadrilateral,
    LagrangeHexahedron,
    LagrangeWedge,
    BezierCurve,
    BezierTriangle,
    BezierQuadrilateral,
    BezierTetrahedron,
    BezierHexahedron,
    BezierWedge,
}

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Empty | CellType::Vertex => 0,
            CellType::Segment | CellType::BezierCurve => 1,
            CellType::Triangle
            | CellType::Quadrilateral
            | CellType::Polygon(_)
            | CellType::LagrangeQuadrilateral
            | CellType::BezierTriangle
            | CellType::BezierQuadrilateral => 2,
            CellType::Tetrahedron
            | CellType::Hexahedron
            | CellType::Prism
            | CellType::Pyramid
            | CellType::Polyhedron
            | CellType::LagrangeHexahedron
            | CellType::LagrangeWedge
            | CellType::BezierTetrahedron
            | CellType::BezierHexahedron
            | CellType::BezierWedge => 3,
        }
    }

    /// Whether the cell carries a polynomial order beyond linear.
    pub fn is_higher_order(self) -> bool {
        matches!(
            self,
            CellType::LagrangeQuadrilateral
                | CellType::LagrangeHexahedron
                | CellType::LagrangeWedge
                | CellType::BezierCurve
                | CellType::BezierTriangle
                | CellType::BezierQuadrilateral
                | CellType::BezierTetrahedron
                | CellType::BezierHexahedron
                | CellType::BezierWedge
        )
    }

    /// Whether the cell is a rational Bezier cell that reads point weights.
    pub fn is_rational(self) -> bool {
        matches!(
            self,
            CellType::BezierCurve
                | CellType::BezierTriangle
                | CellType::BezierQuadrilateral
                | CellType::BezierTetrahedron
                | CellType::BezierHexahedron
                | CellType::BezierWedge
        )
    }
}
