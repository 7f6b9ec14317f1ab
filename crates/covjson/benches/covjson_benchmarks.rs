//! Benchmarks for the covjson crate.
//!
//! Run with: cargo bench --package covjson
//! Or: cargo bench --package covjson --bench covjson_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use covjson::{
    builder::build_range, CoverageWriter, MemorySink, MemorySource, MemoryVariable,
    SelectiveSerializer, TileSet, TilingConfig, WriterConfig,
};
use test_utils::{create_temperature_cube, grid, hourly_times, sequential_array};

fn global_source() -> MemorySource {
    let spec = grid::GLOBAL_1DEG;
    MemorySource::new(spec.x_values(), spec.y_values()).with_variable(
        "temperature",
        MemoryVariable::new(sequential_array(&spec.shape()), &["y", "x"]).with_units("K"),
    )
}

// =============================================================================
// SERIALIZATION BENCHMARKS
// =============================================================================

fn bench_selective_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("selective_serialization");
    let source = global_source();
    let range = build_range(&source, "temperature").unwrap();
    group.throughput(Throughput::Elements(grid::GLOBAL_1DEG.size() as u64));

    group.bench_function("render_range_global_1deg", |b| {
        b.iter(|| {
            let mut serializer = SelectiveSerializer::new(black_box(&range)).unwrap();
            serializer.mark_range_document();
            serializer.render().unwrap()
        })
    });

    group.bench_function("pretty_baseline_global_1deg", |b| {
        b.iter(|| serde_json::to_string_pretty(black_box(&range)).unwrap())
    });

    group.finish();
}

// =============================================================================
// WRITE BENCHMARKS
// =============================================================================

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    let source = global_source();

    group.bench_function("inline_global_1deg", |b| {
        b.iter(|| {
            let config = WriterConfig::new("coverage.covjson", vec!["temperature".to_string()]);
            let mut sink = MemorySink::new();
            CoverageWriter::new(config, &source).write(&mut sink).unwrap()
        })
    });

    for tile in [16usize, 64] {
        group.bench_with_input(BenchmarkId::new("tiled_global_1deg", tile), &tile, |b, &tile| {
            b.iter(|| {
                let config = WriterConfig::new("coverage.covjson", vec!["temperature".to_string()])
                    .tiled(TilingConfig::new(vec![tile, tile]));
                let mut sink = MemorySink::new();
                CoverageWriter::new(config, &source).write(&mut sink).unwrap()
            })
        });
    }

    group.finish();
}

// =============================================================================
// TILING BENCHMARKS
// =============================================================================

fn bench_tiling(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiling");
    let times = hourly_times(24);
    let cube = create_temperature_cube(times.len(), 256, 256);
    let axis_names: Vec<String> = ["t", "y", "x"].iter().map(|s| s.to_string()).collect();
    group.throughput(Throughput::Elements(cube.len() as u64));

    for tile in [32usize, 128, 256] {
        let tile_set = TileSet::new(vec![tile, tile], "{t}.covjson").unwrap();
        group.bench_with_input(BenchmarkId::new("cut_24x256x256", tile), &tile_set, |b, tile_set| {
            b.iter(|| {
                tile_set
                    .tiles(black_box(cube.view()), &axis_names)
                    .unwrap()
                    .map(|t| t.values.len())
                    .sum::<usize>()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_selective_serialization, bench_write, bench_tiling);
criterion_main!(benches);
