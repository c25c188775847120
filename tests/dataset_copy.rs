mod util;
use mesh_dataset::prelude::*;
use util::*;

fn source() -> PointCloud {
    let mut ds = PointCloud::new(random_cloud(32, 2.0, 99));
    let pd = ds.core_mut().point_data_mut();
    pd.set_scalars(DataArray::single_component("p", (0..32).map(f64::from).collect()));
    ds.core_mut()
        .field_data_mut()
        .add_array(DataArray::single_component("time", vec![1.25]));
    ds.bounds();
    ds.scalar_range();
    ds
}

#[test]
fn shallow_copy_shares_arrays() {
    let src = source();
    let mut dst = PointCloud::new(vec![]);
    dst.core_mut().shallow_copy_from(src.core());

    let a = src.core().point_data().array("p").unwrap();
    let b = dst.core().point_data().array("p").unwrap();
    assert!(a.ptr_eq(&b));
    assert_eq!(dst.core().cached_bounds(), src.core().cached_bounds());
    assert_eq!(dst.core().cached_scalar_range(), ScalarRange(0.0, 31.0));
    assert!(dst.core().point_data().scalars().is_some());

    b.write().set_tuple(0, &[-5.0]).unwrap();
    assert_eq!(src.scalar_range(), ScalarRange(-5.0, 31.0));
}

#[test]
fn deep_copy_is_independent() {
    let src = source();
    let mut dst = PointCloud::new(vec![]);
    dst.core_mut().deep_copy_from(src.core());

    let a = src.core().point_data().array("p").unwrap();
    let b = dst.core().point_data().array("p").unwrap();
    assert!(!a.ptr_eq(&b));
    assert_eq!(a.read().buffer(), b.read().buffer());
    assert_eq!(dst.core().cached_bounds(), src.core().cached_bounds());

    b.write().set_tuple(0, &[-5.0]).unwrap();
    assert_eq!(src.scalar_range(), ScalarRange(0.0, 31.0));
    assert_eq!(dst.scalar_range(), ScalarRange(-5.0, 31.0));
    assert_eq!(dst.core().field_data().len(), 1);
}

#[test]
fn copy_attributes_and_initialize() {
    let src = source();
    let mut dst = PointCloud::new(random_cloud(32, 1.0, 1));
    dst.core_mut().copy_attributes(src.core());
    assert_eq!(dst.core().point_data().len(), 1);
    assert!(dst.core().attributes(AttributeKind::Field).array("time").is_some());

    dst.core_mut().initialize();
    assert!(dst.core().point_data().is_empty());
    assert!(dst.core().cell_data().is_empty());
    assert_eq!(dst.core().field_data().len(), 1);
    assert_eq!(dst.scalar_range(), ScalarRange::DEFAULT);
}

#[test]
fn memory_and_squeeze() {
    let mut ds = source();
    let grown = ds.core().point_data().array("p").unwrap();
    grown.write().resize_tuples(10_000);
    grown.write().resize_tuples(32);
    let before = ds.core().actual_memory_size();
    ds.core_mut().squeeze();
    let after = ds.core().actual_memory_size();
    assert!(after < before);
    assert!(after >= 32 * 8);
}

#[test]
fn summary_describes_dataset() {
    let src = source();
    let summary = src.summary();
    assert_eq!(summary.points, 32);
    assert_eq!(summary.cells, 0);
    assert_eq!(summary.point_arrays, vec![("p".to_owned(), 1, 32)]);
    let text = summary.to_string();
    assert!(text.contains("Point data: 1 arrays"));
    assert!(text.contains("Field data: 1 arrays"));
}

#[test]
fn value_types_serialize() {
    let b = Bounds([0.0, 1.0, -1.0, 1.0, 2.0, 3.0]);
    let json = serde_json::to_string(&b).unwrap();
    assert_eq!(serde_json::from_str::<Bounds>(&json).unwrap(), b);
    let e = Extent([0, 4, 0, 4, 0, 0]);
    assert_eq!(serde_json::to_string(&e).unwrap(), "[0,4,0,4,0,0]");
    let r: ScalarRange = serde_json::from_str("[0.0,20.0]").unwrap();
    assert_eq!(r, ScalarRange(0.0, 20.0));
}

#[test]
fn higher_order_cells_read_reserved_arrays() {
    struct Order(Option<[usize; 3]>, Vec<f64>);
    impl HigherOrderCell for Order {
        fn set_order(&mut self, degrees: [usize; 3], _num_points: usize) {
            self.0 = Some(degrees);
        }
        fn set_uniform_order_from_num_points(&mut self, _num_points: usize) {}
        fn set_rational_weights(&mut self, weights: &[f64]) {
            self.1 = weights.to_vec();
        }
    }

    let mut ds = PointCloud::new(vec![[0.0; 3]; 9]);
    ds.push_cell(CellType::BezierQuadrilateral, (0..9).collect());
    ds.core_mut().cell_data_mut().add_array(
        DataArray::from_values("HigherOrderDegrees", 3, vec![2.0, 2.0, 0.0]).unwrap(),
    );
    ds.core_mut()
        .point_data_mut()
        .add_array(DataArray::single_component("RationalWeights", vec![1.0; 9]));

    let mut cell = Order(None, Vec::new());
    let pts: Vec<usize> = (0..9).collect();
    ds.core()
        .configure_cell_order(0, ds.cell_type(0), &pts, &mut cell)
        .unwrap();
    assert_eq!(cell.0, Some([2, 2, 0]));
    assert_eq!(cell.1, vec![1.0; 9]);
    assert_eq!(ds.cell_types(), vec![CellType::BezierQuadrilateral]);
}
