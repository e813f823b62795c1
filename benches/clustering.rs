//! Criterion benchmarks for cluster refinement.
//!
//! Run with: `cargo bench --bench clustering --features synthetic`
//!
//! Measures refinement over synthetic observation sets of increasing size,
//! and the cost of the distance metric on its own.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geoanchor::synthetic::SyntheticScenario;
use geoanchor::{
    ClusterConfig, Coordinate, CoordinateSet, DistanceMode, cluster_with_config,
    haversine_distance,
};
use std::hint::black_box;

fn coordinate_set(observations: usize) -> CoordinateSet {
    let dataset = SyntheticScenario::with_observation_count(observations, observations / 40).generate();
    CoordinateSet::from_observations(&dataset.observations)
}

fn bench_cluster_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster_scaling");
    group.sample_size(20);

    for count in [500, 2_000, 10_000] {
        let coords = coordinate_set(count);
        let config = ClusterConfig::with_radius(0.5);

        group.throughput(Throughput::Elements(coords.len() as u64));
        group.bench_with_input(BenchmarkId::new("refine", count), &coords, |b, coords| {
            b.iter(|| cluster_with_config(black_box(coords), &config));
        });
    }

    group.finish();
}

fn bench_radius(c: &mut Criterion) {
    let coords = coordinate_set(2_000);
    let mut group = c.benchmark_group("cluster_radius");

    for radius in [0.1, 0.5, 2.0, 10.0] {
        let config = ClusterConfig::with_radius(radius);
        group.bench_with_input(
            BenchmarkId::new("refine", format!("{}km", radius)),
            &coords,
            |b, coords| {
                b.iter(|| cluster_with_config(black_box(coords), &config));
            },
        );
    }

    group.finish();
}

fn bench_distance(c: &mut Criterion) {
    let a = Coordinate::new(-77.037852, 38.898556);
    let b = Coordinate::new(-77.043934, 38.897147);

    c.bench_function("haversine_blind", |bench| {
        bench.iter(|| haversine_distance(black_box(&a), black_box(&b), DistanceMode::HemisphereBlind));
    });
    c.bench_function("haversine_signed", |bench| {
        bench.iter(|| haversine_distance(black_box(&a), black_box(&b), DistanceMode::Signed));
    });
}

criterion_group!(benches, bench_cluster_scaling, bench_radius, bench_distance);
criterion_main!(benches);
