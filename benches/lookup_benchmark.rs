//! Benchmarks for netblock lookup.
//!
//! Run with: cargo bench
//!
//! Compares the bisecting IPv4 range lookup against a linear scan as the
//! table grows, and measures end-to-end classification with the built-in data.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ispmap::{IspMapper, MapperConfig, RangeEntry, RangeTable, Request};

/// Generate a table of disjoint /20 blocks with gaps between them.
fn generate_table(count: usize) -> RangeTable {
    let entries = (0..count as u32)
        .map(|i| {
            let low = i << 13;
            RangeEntry::new(low, low + 0x0fff, (i % 60) as i32)
        })
        .collect();
    RangeTable::new(entries).unwrap()
}

/// Generate keys spread across the table, about half landing in gaps.
fn generate_keys(table: &RangeTable, count: usize) -> Vec<u32> {
    let span = table.entries().last().map(|e| e.high).unwrap_or(0);
    let mut state: u32 = 0x9e37_79b9;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            state % span.max(1)
        })
        .collect()
}

/// Benchmark binary vs linear range lookup across table sizes.
fn bench_range_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_lookup");

    for size in [100, 500, 1_000, 5_000].iter() {
        let table = generate_table(*size);
        let keys = generate_keys(&table, 1_000);

        group.throughput(Throughput::Elements(keys.len() as u64));
        group.bench_with_input(BenchmarkId::new("binary", size), size, |b, _| {
            b.iter(|| {
                for key in &keys {
                    black_box(table.lookup(*key));
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("linear", size), size, |b, _| {
            b.iter(|| {
                for key in &keys {
                    black_box(table.lookup_linear(*key));
                }
            })
        });
    }

    group.finish();
}

/// Benchmark classification and bundle assembly with the built-in data.
fn bench_builtin(c: &mut Criterion) {
    let mapper = IspMapper::builtin(MapperConfig::production()).unwrap();
    let addresses = [
        "203.167.129.4",
        "119.224.10.20",
        "196.28.1.1",
        "2001:4478:abcd::1",
        "192.0.2.1",
    ];

    let mut group = c.benchmark_group("builtin");
    group.throughput(Throughput::Elements(addresses.len() as u64));

    group.bench_function("classify", |b| {
        b.iter(|| {
            for address in &addresses {
                black_box(mapper.classify(address));
            }
        })
    });

    let requests: Vec<Request> = addresses
        .iter()
        .map(|a| Request::new(*a).with_country("NZ"))
        .collect();
    group.bench_function("bundle_for", |b| {
        b.iter(|| {
            for request in &requests {
                black_box(mapper.bundle_for(request));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_range_lookup, bench_builtin);
criterion_main!(benches);
