//! Sequential vs parallel kernels.
//!
//! Run with: cargo bench --bench parallel_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use phaser_kernels::{
    run_averaging_fuzzy_barrier, run_averaging_global_barrier, run_averaging_sequential,
    sum_reciprocals_n_way, sum_reciprocals_recursive, sum_reciprocals_sequential,
    sum_reciprocals_two_way, DEFAULT_GRAIN,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;
use std::time::Duration;

fn bench_reciprocal_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("reciprocal_sum");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(5));

    for len in [1 << 16, 1 << 20, 1 << 23] {
        group.throughput(Throughput::Elements(len as u64));
        let mut rng = StdRng::seed_from_u64(42);
        let input: Vec<f64> = (0..len).map(|_| rng.gen_range(1.0..100.0)).collect();

        group.bench_with_input(BenchmarkId::new("sequential", len), &input, |b, input| {
            b.iter(|| sum_reciprocals_sequential(black_box(input)))
        });
        group.bench_with_input(BenchmarkId::new("two_way", len), &input, |b, input| {
            b.iter(|| sum_reciprocals_two_way(black_box(input)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("n_way_8", len), &input, |b, input| {
            b.iter(|| sum_reciprocals_n_way(black_box(input), 8).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("recursive", len), &input, |b, input| {
            b.iter(|| sum_reciprocals_recursive(black_box(input), DEFAULT_GRAIN).unwrap())
        });
    }
    group.finish();
}

fn bench_averaging(c: &mut Criterion) {
    let mut group = c.benchmark_group("averaging");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(5));

    let iterations = 64;
    let tasks = 8;
    for n in [1 << 12, 1 << 16, 1 << 20] {
        group.throughput(Throughput::Elements((n * iterations) as u64));
        let mut seed = vec![0.0f64; n + 2];
        seed[n + 1] = 1.0;

        group.bench_with_input(BenchmarkId::new("sequential", n), &seed, |b, seed| {
            b.iter(|| {
                let (mut next, mut curr) = (seed.clone(), seed.clone());
                run_averaging_sequential(iterations, &mut next, &mut curr, n).unwrap();
                (next, curr)
            })
        });
        group.bench_with_input(BenchmarkId::new("global_barrier", n), &seed, |b, seed| {
            b.iter(|| {
                let (mut next, mut curr) = (seed.clone(), seed.clone());
                run_averaging_global_barrier(iterations, &mut next, &mut curr, n, tasks).unwrap();
                (next, curr)
            })
        });
        group.bench_with_input(BenchmarkId::new("fuzzy_barrier", n), &seed, |b, seed| {
            b.iter(|| {
                let (mut next, mut curr) = (seed.clone(), seed.clone());
                run_averaging_fuzzy_barrier(iterations, &mut next, &mut curr, n, tasks).unwrap();
                (next, curr)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reciprocal_sum, bench_averaging);
criterion_main!(benches);
