//! History Store Benchmarks
//!
//! Every mutation rewrites the whole serialized history, so cost grows with
//! history length. Measured against the in-memory and SQLite backends.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chatai_core::history::HistoryStore;
use chatai_core::storage::{KeyValueStore, MemoryKvStore, SqliteKvStore};

fn seeded(backend: Box<dyn KeyValueStore>, n: usize) -> HistoryStore {
    let mut store = HistoryStore::open(backend);
    for i in 0..n {
        store
            .append(
                format!("Question number {}?", i),
                format!("**Answer** number {} with some markdown body text.", i),
            )
            .unwrap();
    }
    store
}

/// Append at increasing history lengths
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_append");

    for size in [10, 100, 500].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("memory", size), size, |b, &size| {
            b.iter_with_setup(
                || seeded(Box::new(MemoryKvStore::new()), size),
                |mut store| {
                    store.append("new question", "new answer").unwrap();
                    black_box(store)
                },
            )
        });

        group.bench_with_input(BenchmarkId::new("sqlite", size), size, |b, &size| {
            b.iter_with_setup(
                || seeded(Box::new(SqliteKvStore::in_memory().unwrap()), size),
                |mut store| {
                    store.append("new question", "new answer").unwrap();
                    black_box(store)
                },
            )
        });
    }

    group.finish();
}

/// Replace in the middle of the history
fn bench_replace(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_replace");

    for size in [10, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::new("memory", size), size, |b, &size| {
            let mut store = seeded(Box::new(MemoryKvStore::new()), size);
            b.iter(|| {
                store
                    .replace_at(black_box(size / 2), "edited", "edited answer")
                    .unwrap();
            })
        });
    }

    group.finish();
}

/// Reload and parse a persisted history
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_load");

    for size in [10, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::new("sqlite", size), size, |b, &size| {
            let mut store = seeded(Box::new(SqliteKvStore::in_memory().unwrap()), size);
            b.iter(|| black_box(store.load().len()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_append, bench_replace, bench_load);
criterion_main!(benches);
