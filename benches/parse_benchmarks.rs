//! Parsing and aggregation benchmarks
//!
//! Benchmarks for the ingestion hot path:
//! - Newest-block extraction from append-only logs
//! - CSV and counter line grammars
//! - Grouped means
//! - Arrow batch conversion
//!
//! Toyota Way: Measure before optimizing (Genchi Genbutsu)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trueno_perflog::aggregate::{summarize, Grouping};
use trueno_perflog::experiment::Record;
use trueno_perflog::parse::{
    extract_latest_block, parse_counter_region, parse_csv_region, DEFAULT_BLOCK_MARKER,
};
use trueno_perflog::storage::records_to_batch;

/// Throughput log with `blocks` appended runs of `rows` rows each
fn throughput_log(blocks: usize, rows: u32) -> String {
    let mut text = String::new();
    for block in 0..blocks {
        text.push_str(DEFAULT_BLOCK_MARKER);
        text.push_str("\nThreads,HashBits,Throughput\n");
        for row in 0..rows {
            let threads = 1 << (row % 6);
            let bits = 3 + row % 16;
            text.push_str(&format!("{threads},{bits},{}.{}\n", 100 + row, block % 10));
        }
    }
    text
}

/// `perf stat` log with `runs` counter blocks
fn perf_log(runs: u32) -> String {
    let mut text = String::new();
    for run in 0..runs {
        let threads = 1 << (run % 6);
        let bits = 3 + run % 16;
        text.push_str(&format!(
            ">>> Running ./independent with {threads} threads and {bits} hashbits\n\n \
             Performance counter stats for './independent {threads} {bits}' (5 runs):\n\n"
        ));
        text.push_str("     5,305,595,199      cpu-cycles                ( +-  0.06% )\n");
        text.push_str("     9,001,204,118      instructions              ( +-  0.02% )\n");
        text.push_str("         3,120,556      cache-misses              ( +-  1.80% )\n");
        text.push_str("          1,234.56 msec task-clock      #    0.998 CPUs utilized\n\n");
        text.push_str("       1.234 +- 0.002 seconds time elapsed  ( +-  0.17% )\n\n");
    }
    text
}

/// Benchmark newest-block extraction as the log grows
fn bench_block_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_extraction");

    for blocks in [1, 10, 100].iter() {
        let text = throughput_log(*blocks, 96);

        group.bench_with_input(BenchmarkId::from_parameter(blocks), blocks, |b, _| {
            b.iter(|| {
                let block = extract_latest_block(black_box(&text), DEFAULT_BLOCK_MARKER);
                black_box(block.lines().len());
            });
        });
    }

    group.finish();
}

/// Benchmark the CSV grammar
fn bench_csv_region(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_region");

    for rows in [100, 1_000, 10_000].iter() {
        let text = throughput_log(1, *rows);

        group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, _| {
            b.iter(|| {
                let outcome = parse_csv_region(black_box(&text).lines());
                black_box(outcome);
            });
        });
    }

    group.finish();
}

/// Benchmark the counter grammar
fn bench_counter_region(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter_region");

    for runs in [10, 100, 1_000].iter() {
        let text = perf_log(*runs);

        group.bench_with_input(BenchmarkId::from_parameter(runs), runs, |b, _| {
            b.iter(|| {
                let outcome = parse_counter_region(black_box(&text).lines());
                black_box(outcome);
            });
        });
    }

    group.finish();
}

/// Benchmark grouped means and Arrow conversion
fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");

    for size in [1_000, 10_000, 100_000].iter() {
        let records: Vec<Record> = (0..*size)
            .map(|i: u32| Record::new(1 << (i % 6), 3 + i % 16, "cpu-cycles", f64::from(i)))
            .collect();

        group.bench_with_input(BenchmarkId::new("means", size), size, |b, _| {
            b.iter(|| {
                let table = summarize(black_box(&records), Grouping::MetricThreadsHashBits);
                black_box(table);
            });
        });

        group.bench_with_input(BenchmarkId::new("to_arrow", size), size, |b, _| {
            b.iter(|| {
                let batch = records_to_batch(black_box(&records)).unwrap();
                black_box(batch);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_block_extraction,
    bench_csv_region,
    bench_counter_region,
    bench_summarize
);
criterion_main!(benches);
