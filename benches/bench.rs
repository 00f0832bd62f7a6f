// Criterion benchmarks for Mock Pairs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mock_pairs::core::{blossom, pair_signups};
use mock_pairs::models::{CycleId, ExclusionHistory, Signup, UnorderedPair};

fn cycle() -> CycleId {
    CycleId::new(2025, 33).unwrap()
}

/// Participants picking 3 of 12 timeslots in a fixed spread
fn create_signups(count: usize) -> Vec<Signup> {
    (0..count)
        .map(|i| {
            let slots = [(i * 7) % 12, (i * 5 + 3) % 12, (i * 11 + 1) % 12];
            Signup::new(format!("user{}", i), cycle(), slots.map(|s| s as u16))
        })
        .collect()
}

/// Every third consecutive pair has already met
fn create_history(signups: &[Signup]) -> ExclusionHistory {
    signups
        .windows(2)
        .step_by(3)
        .map(|w| UnorderedPair::new(w[0].participant_id.clone(), w[1].participant_id.clone()))
        .collect()
}

/// Chain of triangles; forces blossom contraction during augmentation
fn triangle_chain(triangles: usize) -> (usize, Vec<(usize, usize)>) {
    let mut edges = Vec::new();
    for t in 0..triangles {
        let base = t * 3;
        edges.push((base, base + 1));
        edges.push((base + 1, base + 2));
        edges.push((base, base + 2));
        if t > 0 {
            edges.push((base - 1, base));
        }
    }
    (triangles * 3, edges)
}

fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("blossom_solve");

    for triangles in [10, 30, 100].iter() {
        let (n, edges) = triangle_chain(*triangles);
        group.bench_with_input(BenchmarkId::from_parameter(n), &edges, |b, edges| {
            b.iter(|| blossom::solve(black_box(n), black_box(edges)));
        });
    }

    group.finish();
}

fn bench_pair_signups(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_signups");

    for count in [20, 60, 200].iter() {
        let signups = create_signups(*count);
        let history = create_history(&signups);
        group.bench_with_input(BenchmarkId::from_parameter(count), &signups, |b, signups| {
            b.iter(|| pair_signups(cycle(), black_box(signups.clone()), black_box(&history)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_solver, bench_pair_signups);
criterion_main!(benches);
