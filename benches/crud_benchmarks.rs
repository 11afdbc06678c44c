use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::BTreeMap;

use bplustree_map::{BPlusTreeMap, Config};

const N: usize = 10_000;

/// Fan-outs compared by the order-sweep groups.
const ORDERS: [usize; 4] = [4, 8, 32, 128];

// ─── Helper functions to generate key sequences ─────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn map_with_order(max_order: usize) -> BPlusTreeMap<i64, i64> {
    BPlusTreeMap::with_config(Config::new(max_order)).expect("benchmark orders are valid")
}

fn populated(max_order: usize, keys: &[i64]) -> BPlusTreeMap<i64, i64> {
    let mut map = map_with_order(max_order);
    map.extend(keys.iter().map(|&k| (k, k)));
    map
}

// ─── Insert ─────────────────────────────────────────────────────────────────

fn bench_insert_ordered(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_ordered");

    group.bench_function(BenchmarkId::new("BPlusTreeMap", N), |b| {
        b.iter(|| {
            let mut map = map_with_order(32);
            for i in 0..N as i64 {
                map.insert(i, i).unwrap();
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for i in 0..N as i64 {
                map.insert(i, i);
            }
            map
        });
    });

    group.finish();
}

fn bench_insert_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_reverse");

    group.bench_function(BenchmarkId::new("BPlusTreeMap", N), |b| {
        b.iter(|| {
            let mut map = map_with_order(32);
            for i in (0..N as i64).rev() {
                map.insert(i, i).unwrap();
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for i in (0..N as i64).rev() {
                map.insert(i, i);
            }
            map
        });
    });

    group.finish();
}

fn bench_insert_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("insert_random");

    group.bench_function(BenchmarkId::new("BPlusTreeMap", N), |b| {
        b.iter(|| {
            let mut map = map_with_order(32);
            for &k in &keys {
                map.insert(k, k).unwrap();
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for &k in &keys {
                map.insert(k, k);
            }
            map
        });
    });

    group.finish();
}

/// How the configurable fan-out shifts insert cost.
fn bench_insert_order_sweep(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("insert_random_by_order");

    for order in ORDERS {
        group.bench_function(BenchmarkId::new("BPlusTreeMap", order), |b| {
            b.iter(|| {
                let mut map = map_with_order(order);
                for &k in &keys {
                    map.insert(k, k).unwrap();
                }
                map
            });
        });
    }

    group.finish();
}

// ─── Get ────────────────────────────────────────────────────────────────────

fn bench_get_ordered(c: &mut Criterion) {
    let keys = ordered_keys(N);
    let bp_map = populated(32, &keys);
    let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

    let mut group = c.benchmark_group("get_ordered");

    group.bench_function(BenchmarkId::new("BPlusTreeMap", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &keys {
                if let Some(&v) = bp_map.get(&k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &keys {
                if let Some(&v) = bt_map.get(&k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.finish();
}

fn bench_get_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let bp_map = populated(32, &keys);
    let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

    let mut group = c.benchmark_group("get_random");

    group.bench_function(BenchmarkId::new("BPlusTreeMap", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &keys {
                if let Some(&v) = bp_map.get(&k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &keys {
                if let Some(&v) = bt_map.get(&k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.finish();
}

// ─── Remove ─────────────────────────────────────────────────────────────────

fn bench_remove_ordered(c: &mut Criterion) {
    let keys = ordered_keys(N);

    let mut group = c.benchmark_group("remove_ordered");

    group.bench_function(BenchmarkId::new("BPlusTreeMap", N), |b| {
        b.iter_batched(
            || populated(32, &keys),
            |mut map| {
                for &k in &keys {
                    map.remove(&k);
                }
                map
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter_batched(
            || keys.iter().map(|&k| (k, k)).collect::<BTreeMap<i64, i64>>(),
            |mut map| {
                for &k in &keys {
                    map.remove(&k);
                }
                map
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_remove_random(c: &mut Criterion) {
    let keys = random_keys(N);

    let mut group = c.benchmark_group("remove_random");

    group.bench_function(BenchmarkId::new("BPlusTreeMap", N), |b| {
        b.iter_batched(
            || populated(32, &keys),
            |mut map| {
                for &k in &keys {
                    map.remove(&k);
                }
                map
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter_batched(
            || keys.iter().map(|&k| (k, k)).collect::<BTreeMap<i64, i64>>(),
            |mut map| {
                for &k in &keys {
                    map.remove(&k);
                }
                map
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ─── Scan ───────────────────────────────────────────────────────────────────

fn bench_full_scan(c: &mut Criterion) {
    let keys = random_keys(N);
    let bp_map = populated(32, &keys);
    let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

    let mut group = c.benchmark_group("full_scan");

    group.bench_function(BenchmarkId::new("BPlusTreeMap", N), |b| {
        b.iter(|| bp_map.iter().fold(0i64, |sum, (_, &v)| sum.wrapping_add(v)));
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| bt_map.iter().fold(0i64, |sum, (_, &v)| sum.wrapping_add(v)));
    });

    group.finish();
}

fn bench_range_scan(c: &mut Criterion) {
    let keys = ordered_keys(N);
    let bp_map = populated(32, &keys);
    let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

    // A window of roughly a tenth of the key space.
    let lo = (N / 2) as i64;
    let hi = lo + (N / 10) as i64;

    let mut group = c.benchmark_group("range_scan");

    group.bench_function(BenchmarkId::new("BPlusTreeMap", N), |b| {
        b.iter(|| bp_map.range(lo..hi).fold(0i64, |sum, (_, &v)| sum.wrapping_add(v)));
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| bt_map.range(lo..hi).fold(0i64, |sum, (_, &v)| sum.wrapping_add(v)));
    });

    group.finish();
}

// ─── Criterion Groups ───────────────────────────────────────────────────────

criterion_group!(
    insert_benches,
    bench_insert_ordered,
    bench_insert_reverse,
    bench_insert_random,
    bench_insert_order_sweep,
);

criterion_group!(get_benches, bench_get_ordered, bench_get_random,);

criterion_group!(remove_benches, bench_remove_ordered, bench_remove_random,);

criterion_group!(scan_benches, bench_full_scan, bench_range_scan,);

criterion_main!(insert_benches, get_benches, remove_benches, scan_benches,);
