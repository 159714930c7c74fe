//! Benchmarks for glob compilation and in-memory search
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use metric_discovery::backend::MemoryBackend;
use metric_discovery::discovery::{
    Annotations, DiscoveryIo, IndexTargets, Locator, MetricDiscovery, DEFAULT_READ_INDEX,
    DEFAULT_WRITE_INDEX,
};
use metric_discovery::glob::{next_level_matcher, translate_query};
use std::sync::Arc;

const PATTERNS: [&str; 5] = [
    "one.two.three.four.five",
    "one.two.*",
    "one.two.three0?",
    "a.{b,c}.d[0-2].e",
    "{prod,staging}.{web,db}[0-9][0-9].cpu.{user,system,idle}",
];

fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate_query");

    for pattern in PATTERNS {
        group.bench_function(pattern, |b| {
            b.iter(|| translate_query(black_box(pattern)).unwrap())
        });
    }

    group.finish();
}

fn bench_next_level(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_level");

    group.bench_function("compile", |b| {
        b.iter(|| next_level_matcher(black_box("foo.bar.*")).unwrap())
    });

    let matcher = next_level_matcher("foo.bar.*").unwrap();
    group.bench_function("match", |b| {
        b.iter(|| matcher.is_match(black_box("foo.bar.baz.qux")))
    });

    group.finish();
}

fn bench_memory_search(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let discovery = MetricDiscovery::new(
        Arc::new(MemoryBackend::with_read_alias(DEFAULT_READ_INDEX, DEFAULT_WRITE_INDEX)),
        Arc::new(IndexTargets::default()),
    )
    .with_max_results(100_000);

    let size = 10_000;
    rt.block_on(async {
        let batch = (0..size).map(|i| {
            let name = format!("host{}.cpu{}.metric{}", i % 100, i % 8, i);
            (Locator::new("bench", name).unwrap(), None::<Annotations>)
        });
        discovery.writer().insert(batch).await.unwrap();
    });

    let mut group = c.benchmark_group("memory_search");
    group.throughput(Throughput::Elements(size as u64));

    group.bench_function("wildcard", |b| {
        b.iter(|| rt.block_on(discovery.search("bench", black_box("host1*.cpu3.*"))).unwrap())
    });

    group.bench_function("alternation", |b| {
        b.iter(|| {
            rt.block_on(discovery.search("bench", black_box("host{1,2,3}.cpu[0-3].*")))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_translate, bench_next_level, bench_memory_search);
criterion_main!(benches);
