// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use proximity_index::{KdTree, Point};

use rstar::RTree;

fn gen_lattice(side: usize, cell: f64) -> Vec<Point> {
    let mut out = Vec::with_capacity(side * side * side);
    for z in 0..side {
        for y in 0..side {
            for x in 0..side {
                let id = out.len() as u64;
                // Small skew keeps distances from tying everywhere.
                let jitter = (id % 7) as f64 * 1e-3;
                out.push(Point::new(
                    id,
                    x as f64 * cell + jitter,
                    y as f64 * cell,
                    z as f64 * cell - jitter,
                ));
            }
        }
    }
    out
}

fn to_rstar_points(v: &[Point]) -> Vec<[f64; 3]> {
    v.iter().map(Point::coords).collect()
}

fn bench_knn_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_external_compare");
    for &side in &[16usize, 32] {
        let points = gen_lattice(side, 10.0);
        let queries: Vec<Point> = points.iter().step_by(17).copied().collect();
        group.throughput(Throughput::Elements(points.len() as u64));

        group.bench_function(format!("kdtree_build_knn8_side{}", side), |b| {
            b.iter(|| {
                let tree = KdTree::build(&points);
                let mut total = 0.0;
                for q in &queries {
                    for h in tree.k_nearest(q, 8) {
                        total += h.distance;
                    }
                }
                black_box(total)
            })
        });

        group.bench_function(format!("rstar_build_knn8_side{}", side), |b| {
            b.iter_batched(
                || to_rstar_points(&points),
                |coords| {
                    let tree = RTree::bulk_load(coords);
                    let mut total = 0.0;
                    for q in &queries {
                        // rstar returns the query point itself first.
                        for p in tree.nearest_neighbor_iter(&q.coords()).skip(1).take(8) {
                            let [dx, dy, dz] = [p[0] - q.x, p[1] - q.y, p[2] - q.z];
                            total += (dx * dx + dy * dy + dz * dz).sqrt();
                        }
                    }
                    black_box(total)
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_knn_external_compare);
criterion_main!(benches);
