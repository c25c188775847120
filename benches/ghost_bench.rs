use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use mesh_dataset::algs::ghost_classify::{mark_duplicate_cells, mark_duplicate_points};
use mesh_dataset::algs::reduce::ParallelReducer;
use mesh_dataset::topology::extent::Extent;

fn bench_ghost_marking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ghost_marking");
    let serial = ParallelReducer::serial();
    let shared = ParallelReducer::shared();

    for &n in &[32i32, 128] {
        // one layer of padding on every side
        let extent = Extent([-1, n, -1, n, -1, n]);
        let canonical = Extent([0, n - 1, 0, n - 1, 0, n - 1]);
        let mut points = vec![0u8; extent.point_count()];
        let mut cells = vec![0u8; extent.cell_count()];

        group.bench_with_input(BenchmarkId::new("points_serial", n), &n, |b, _| {
            b.iter(|| black_box(mark_duplicate_points(&serial, extent, canonical, &mut points)));
        });

        group.bench_with_input(BenchmarkId::new("points_parallel", n), &n, |b, _| {
            b.iter(|| black_box(mark_duplicate_points(shared, extent, canonical, &mut points)));
        });

        group.bench_with_input(BenchmarkId::new("cells_parallel", n), &n, |b, _| {
            b.iter(|| black_box(mark_duplicate_cells(shared, extent, canonical, &mut cells)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ghost_marking);
criterion_main!(benches);
