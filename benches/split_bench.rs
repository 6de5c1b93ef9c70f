//! Benchmarks for stratified splitting.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::explicit_iter_loop,
    missing_docs
)]

use std::sync::Arc;

use arrow::array::Int32Array;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stratasplit::{
    parallel::PartitionExecutor, ClassDomain, PartitionedColumn, StratifiedSampler,
    StratifiedSplit,
};

fn create_column(rows: usize, classes: i32, partition_len: usize) -> PartitionedColumn {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let values: Vec<i32> = (0..rows as i32).map(|i| (i * 7919) % classes).collect();
    PartitionedColumn::from_array("label", Arc::new(Int32Array::from(values)), partition_len)
        .expect("Failed to create column")
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("stratified_split");

    for size in [1_000, 10_000, 100_000].iter() {
        let column = create_column(*size, 10, 4_096);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &column, |b, column| {
            let split = StratifiedSplit::new(0.2).seed(42);
            b.iter(|| split.run(black_box(column)).expect("split"));
        });
    }

    group.finish();
}

fn bench_split_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_workers");
    let column = create_column(200_000, 50, 8_192);
    group.throughput(Throughput::Elements(200_000));

    for workers in [0, 2, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::new("workers", workers), workers, |b, &workers| {
            let split = StratifiedSplit::new(0.2).seed(42).num_workers(workers);
            b.iter(|| split.run(black_box(&column)).expect("split"));
        });
    }

    group.finish();
}

fn bench_domain_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("domain_resolution");

    for classes in [2, 100, 10_000].iter() {
        let column = create_column(100_000, *classes, 8_192);
        group.bench_with_input(BenchmarkId::from_parameter(classes), &column, |b, column| {
            let executor = PartitionExecutor::inline();
            b.iter(|| ClassDomain::resolve(black_box(column), &executor).expect("domain"));
        });
    }

    group.finish();
}

fn bench_sample_class(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_class");
    let rows: Vec<u64> = (0..100_000).collect();

    for frac in [0.01, 0.2, 0.9].iter() {
        let sampler = StratifiedSampler::new(*frac, 7).expect("sampler");
        group.bench_with_input(BenchmarkId::from_parameter(frac), &rows, |b, rows| {
            b.iter(|| sampler.sample_class(0, black_box(rows)).expect("sample"));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_split,
    bench_split_workers,
    bench_domain_resolution,
    bench_sample_class,
);
criterion_main!(benches);
