//! Benchmarks for grid construction and A* pathfinding.
//!
//! Run with: cargo bench -p emberfield_worldmap

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emberfield_worldmap::config::GridConfig;
use emberfield_worldmap::coord::CubeCoord;
use emberfield_worldmap::grid::HexGrid;
use emberfield_worldmap::pathfinding::find_path;

fn grid_of_radius(radius: u32) -> HexGrid {
    let config = GridConfig {
        grid_radius: radius,
        ..GridConfig::default()
    };
    HexGrid::new(config, 42).expect("default config is valid")
}

fn bench_grid_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_build");
    for radius in [8, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |b, &r| {
            b.iter(|| black_box(grid_of_radius(r)));
        });
    }
    group.finish();
}

fn bench_corner_to_corner(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path_corner_to_corner");
    for radius in [8, 16, 32] {
        let grid = grid_of_radius(radius);
        let r = radius as i32;
        let start = CubeCoord::new(r, -r, 0).expect("corner is a valid coordinate");
        let goal = CubeCoord::new(-r, r, 0).expect("corner is a valid coordinate");

        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |b, _| {
            b.iter(|| black_box(find_path(&grid, start, goal)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_grid_build, bench_corner_to_corner);
criterion_main!(benches);
