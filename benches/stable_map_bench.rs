use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use stable_collections::StableMap;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (StableMap<String, u64>, Vec<String>) {
    let keys: Vec<_> = lcg(seed).take(n).map(key).collect();
    let mut m = StableMap::new();
    for (i, k) in keys.iter().enumerate() {
        m.insert(k.clone(), i as u64);
    }
    (m, keys)
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("stable_map_insert_10k", |b| {
        b.iter_batched(
            StableMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("stable_map_get_hit", |b| {
        let (m, keys) = filled(7, 20_000);
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.get(k));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("stable_map_get_miss", |b| {
        let (m, _) = filled(11, 10_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // generate keys unlikely in map
            let k = key(miss.next().unwrap());
            black_box(m.get(&k));
        })
    });
}

fn bench_remove_reinsert(c: &mut Criterion) {
    c.bench_function("stable_map_remove_reinsert", |b| {
        let (mut m, keys) = filled(13, 10_000);
        let mut it = keys.iter().cycle();
        b.iter(|| {
            // Exercises tombstone reuse and stale-entry index rebuilds.
            let k = it.next().unwrap();
            let v = m.remove(k).unwrap();
            black_box(m.assign_value(k.clone(), v));
        })
    });
}

fn bench_clone_then_write(c: &mut Criterion) {
    c.bench_function("stable_map_clone_then_write_1k", |b| {
        let (m, _) = filled(17, 1_000);
        b.iter(|| {
            let mut copy = m.clone();
            copy.insert("fresh".to_string(), 0);
            black_box(copy)
        })
    });
}

fn bench_iterate(c: &mut Criterion) {
    c.bench_function("stable_map_iterate_sparse_10k", |b| {
        let (mut m, keys) = filled(19, 10_000);
        for k in keys.iter().step_by(3) {
            m.remove(k);
        }
        b.iter(|| black_box(m.values().sum::<u64>()))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_get_hit, bench_get_miss, bench_remove_reinsert,
        bench_clone_then_write, bench_iterate
}
criterion_main!(benches);
