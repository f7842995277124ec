// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use proximity_index::{IncrementalIndex, KdTree, Point, exact_top_k, indexed_top_k};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
    fn in_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

fn gen_uniform(n: usize, side: f64, seed: u64) -> Vec<Point> {
    let mut rng = Rng::new(seed);
    (0..n)
        .map(|i| {
            Point::new(
                i as u64,
                rng.in_range(0.0, side),
                rng.in_range(0.0, side),
                rng.in_range(0.0, side),
            )
        })
        .collect()
}

fn gen_clustered(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Point> {
    let mut rng = Rng::new(0xC0FFEE);
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    for _ in 0..n_clusters {
        let cx = rng.in_range(0.0, 10_000.0);
        let cy = rng.in_range(0.0, 10_000.0);
        let cz = rng.in_range(0.0, 10_000.0);
        for _ in 0..per_cluster {
            let id = out.len() as u64;
            out.push(Point::new(
                id,
                cx + rng.in_range(-spread, spread),
                cy + rng.in_range(-spread, spread),
                cz + rng.in_range(-spread, spread),
            ));
        }
    }
    out
}

fn gen_collinear(n: usize, step: f64) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let t = i as f64 * step;
            Point::new(i as u64, t, 2.0 * t, -t)
        })
        .collect()
}

fn bench_kdtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree");
    for &n in &[1_000usize, 10_000, 100_000] {
        let points = gen_uniform(n, 1_000.0, 0x9E37_79B9);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("build_n{}", n), |b| {
            b.iter(|| black_box(KdTree::build(&points)))
        });

        let tree = KdTree::build(&points);
        group.bench_function(format!("knn16_all_n{}", n), |b| {
            b.iter(|| {
                let mut total = 0.0;
                for p in points.iter().step_by(10) {
                    for h in tree.k_nearest(p, 16) {
                        total += h.distance;
                    }
                }
                black_box(total)
            })
        });
    }
    group.finish();
}

fn bench_topk_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk");
    let inputs = [
        ("uniform", gen_uniform(2_000, 1_000.0, 7)),
        ("clustered", gen_clustered(40, 50, 5.0)),
        ("collinear", gen_collinear(2_000, 0.5)),
    ];
    for (label, points) in &inputs {
        group.throughput(Throughput::Elements(points.len() as u64));
        for &k in &[1usize, 10, 100] {
            group.bench_function(format!("exact_{}_k{}", label, k), |b| {
                b.iter(|| black_box(exact_top_k(points, k)))
            });
            group.bench_function(format!("indexed_{}_k{}", label, k), |b| {
                b.iter(|| black_box(indexed_top_k(points, k, None)))
            });
        }
    }

    let large = gen_uniform(50_000, 10_000.0, 11);
    group.throughput(Throughput::Elements(large.len() as u64));
    group.bench_function("indexed_uniform_n50000_k10", |b| {
        b.iter(|| black_box(indexed_top_k(&large, 10, None)))
    });
    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental");
    let points = gen_uniform(10_000, 1_000.0, 21);
    for &threshold in &[10usize, 50, 200] {
        group.bench_function(format!("walk_then_query_threshold{}", threshold), |b| {
            b.iter_batched(
                || IncrementalIndex::new(points.iter().copied(), threshold).unwrap(),
                |mut idx| {
                    for tick in 0..20 {
                        let _ = idx.batch_random_walk(0.002, 2.0, tick).unwrap();
                        black_box(idx.current_top_k(10).unwrap());
                    }
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.bench_function("update_point_only", |b| {
        b.iter_batched(
            || (IncrementalIndex::new(points.iter().copied(), 50).unwrap(), Rng::new(3)),
            |(mut idx, mut rng)| {
                for _ in 0..1_000 {
                    let id = rng.next_u64() % 10_000;
                    let coords = [
                        rng.in_range(0.0, 1_000.0),
                        rng.in_range(0.0, 1_000.0),
                        rng.in_range(0.0, 1_000.0),
                    ];
                    idx.update_point(id, coords);
                }
                black_box(idx.rebuild_count())
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_kdtree, bench_topk_paths, bench_incremental);
criterion_main!(benches);
