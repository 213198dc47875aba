//! Insert, lookup and delete throughput across backends.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use keyset::{Backend, Collection, Key};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn generate_keys(n: usize, rng: &mut StdRng) -> Vec<Key> {
    (0..n)
        .map(|_| format!("a{}", rng.gen::<u64>() >> 1).into_bytes())
        .collect()
}

fn backends() -> Vec<Backend> {
    vec![
        Backend::FlatSorted,
        Backend::LazySorted,
        Backend::RedBlack,
        Backend::BTree { degree: 32 },
    ]
}

fn load(backend: Backend, keys: &[Key]) -> keyset::AnyCollection {
    let mut c = backend.build().expect("valid backend");
    for key in keys {
        c.add(key.clone());
    }
    c.freeze();
    c
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    let mut rng = StdRng::seed_from_u64(1);

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_keys(size, &mut rng);

        for backend in backends() {
            // Re-sorting on every add makes large flat loads quadratic.
            if backend == Backend::FlatSorted && size > 10_000 {
                continue;
            }
            group.bench_with_input(BenchmarkId::new(backend.to_string(), size), &keys, |b, keys| {
                b.iter_batched(
                    || keys.clone(),
                    |keys| {
                        let mut coll = backend.build().expect("valid backend");
                        for key in keys {
                            coll.add(key);
                        }
                        coll.freeze();
                        black_box(coll)
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    let mut rng = StdRng::seed_from_u64(2);

    for size in [1_000, 10_000, 100_000] {
        let mut keys = generate_keys(size, &mut rng);
        let loaded: Vec<_> = backends()
            .into_iter()
            .filter(|b| *b != Backend::FlatSorted || size <= 10_000)
            .map(|b| (b, load(b, &keys)))
            .collect();
        keys.shuffle(&mut rng);

        for (backend, coll) in &loaded {
            group.bench_with_input(BenchmarkId::new(backend.to_string(), size), &keys, |b, keys| {
                b.iter(|| {
                    let mut found = 0usize;
                    for key in keys {
                        if coll.get(key).is_some() {
                            found += 1;
                        }
                    }
                    black_box(found)
                });
            });
        }
    }

    group.finish();
}

fn bench_lookup_by_degree(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_by_degree");
    let mut rng = StdRng::seed_from_u64(3);
    let mut keys = generate_keys(100_000, &mut rng);

    let trees: Vec<_> = [2, 3, 4, 32]
        .into_iter()
        .map(|degree| (degree, load(Backend::BTree { degree }, &keys)))
        .collect();
    keys.shuffle(&mut rng);

    for (degree, tree) in &trees {
        group.bench_with_input(BenchmarkId::new("btree", degree), &keys, |b, keys| {
            b.iter(|| {
                let mut found = 0usize;
                for key in keys {
                    if tree.get(key).is_some() {
                        found += 1;
                    }
                }
                black_box(found)
            });
        });
    }

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete");
    let mut rng = StdRng::seed_from_u64(4);

    for size in [1_000, 10_000] {
        let mut keys = generate_keys(size, &mut rng);
        let loaded: Vec<_> = backends().into_iter().map(|b| (b, load(b, &keys))).collect();
        keys.shuffle(&mut rng);

        for (backend, coll) in &loaded {
            group.bench_with_input(BenchmarkId::new(backend.to_string(), size), &keys, |b, keys| {
                b.iter_batched(
                    || coll.clone(),
                    |mut coll| {
                        for key in keys {
                            black_box(coll.delete(key));
                        }
                        coll
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup, bench_lookup_by_degree, bench_delete);
criterion_main!(benches);
