//! Performance benchmarks for roadmap-lib
//!
//! Run with: cargo bench --package roadmap-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::Coord;
use roadmap_lib::{
    Config, LoadContext, NodeId, Rect, RenderInstructions, RenderOrchestrator, RoadCategory,
    RoadNetwork, SegmentRecord, Viewport, ViewportConfig, WindowSize,
};
use std::collections::HashSet;

/// Generate a jittered street grid of `size` x `size` intersections, 100 units apart.
///
/// Every tenth row is a highway, every fifth column a prime route, the rest are paths.
fn generate_grid(size: u64) -> (LoadContext, Vec<SegmentRecord>) {
    let mut context = LoadContext::new();
    let mut records = Vec::new();
    let id = |row: u64, col: u64| NodeId(row * size + col);
    let position = |row: u64, col: u64| Coord {
        x: col as f64 * 100.0 + ((row * 7 + col * 13) % 17) as f64,
        y: row as f64 * 100.0 + ((row * 11 + col * 5) % 19) as f64,
    };

    for row in 0..size {
        let nodes: Vec<_> = (0..size)
            .map(|col| (id(row, col), position(row, col)))
            .collect();
        let category = if row % 10 == 0 {
            RoadCategory::Highway
        } else {
            RoadCategory::Path
        };
        records.extend(context.intern_polyline(&nodes, category, "row").unwrap());
    }
    for col in 0..size {
        let nodes: Vec<_> = (0..size)
            .map(|row| (id(row, col), position(row, col)))
            .collect();
        let category = if col % 5 == 0 {
            RoadCategory::PrimeRoute
        } else {
            RoadCategory::Other
        };
        records.extend(context.intern_polyline(&nodes, category, "column").unwrap());
    }

    (context, records)
}

fn build_network(size: u64) -> RoadNetwork {
    let (context, records) = generate_grid(size);
    RoadNetwork::build(&context, records, &Config::default()).unwrap()
}

// ============================================================================
// Core Benchmarks
// ============================================================================

fn bench_query_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    // 300x300 grid, ~180k segments
    let network = build_network(300);

    let small_viewport = Rect::new(12_000.0, 12_000.0, 1_000.0, 800.0);
    group.bench_function("small_viewport_180k", |b| {
        b.iter(|| network.query(&small_viewport));
    });

    let large_viewport = Rect::new(0.0, 0.0, 20_000.0, 15_000.0);
    group.bench_function("large_viewport_180k", |b| {
        b.iter(|| network.query(&large_viewport));
    });

    let highways: HashSet<_> = [RoadCategory::Highway].into_iter().collect();
    group.bench_function("filtered_large_viewport_180k", |b| {
        b.iter(|| network.query_visible(&large_viewport, &highways));
    });

    group.finish();
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    group.sample_size(20);

    for size in [100u64, 200] {
        let (context, records) = generate_grid(size);
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(BenchmarkId::new("grid", size), &size, |b, _| {
            b.iter(|| RoadNetwork::build(&context, records.clone(), &Config::default()).unwrap());
        });
    }

    group.finish();
}

fn bench_line_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("lines");

    let network = build_network(200);
    let orchestrator = RenderOrchestrator::new(network.index());
    let instructions = RenderInstructions::default();
    let window = WindowSize::new(1024, 768).unwrap();
    let mut viewport = Viewport::new(network.bounds(), window, &ViewportConfig::default()).unwrap();
    viewport.zoom_to(0.25).unwrap();

    let projection = viewport.projection();
    group.bench_function("full_view", |b| {
        b.iter(|| {
            orchestrator.get_lines(
                &projection.source,
                &projection.target,
                window.height as f64,
                &instructions,
                &RenderOrchestrator::DEFAULT_PRIORITY,
            )
        });
    });

    group.bench_function("pan_reveal", |b| {
        b.iter(|| {
            let projections = viewport.move_by(24.0, -16.0).unwrap();
            orchestrator.lines_for_projections(
                &projections,
                window.height as f64,
                &instructions,
                &RenderOrchestrator::DEFAULT_PRIORITY,
            )
        });
    });

    group.finish();
}

fn bench_network_info(c: &mut Criterion) {
    let mut group = c.benchmark_group("info");

    let network = build_network(200);
    group.bench_function("get_info", |b| {
        b.iter(|| network.info());
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_query_performance,
    bench_construction,
    bench_line_generation,
    bench_network_info,
);

criterion_main!(benches);
