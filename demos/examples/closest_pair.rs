// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Top-k closest pairs through both query paths.
//!
//! Runs the exact all-pairs scan and the certified k-d tree search over the
//! same points and shows that they agree, ties included.
//!
//! Run:
//! - `cargo run -p proximity_demos --example closest_pair`
//! - `RUST_LOG=proximity_index=debug cargo run -p proximity_demos --example closest_pair`

use proximity_index::{Method, Point, TopKConfig, closest_pair, top_k_pairs};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let points = [
        Point::new(0, 0.0, 0.0, 0.0),
        Point::new(1, 1.0, 1.0, 1.0),
        Point::new(2, 0.1, 0.1, 0.1),
        Point::new(3, 5.0, 5.0, 5.0),
    ];

    for method in [Method::Exact, Method::Indexed] {
        let cfg = TopKConfig::default().with_method(method);
        println!("{method}:");
        match top_k_pairs(&points, 3, &cfg) {
            Ok(top) => {
                for pair in top {
                    println!(
                        "  ({}, {})  distance {:.6}",
                        pair.first.id, pair.second.id, pair.distance
                    );
                }
            }
            Err(err) => println!("  error: {err}"),
        }
    }

    // A unit lattice: every nearest pair is tied at distance 1.
    let mut lattice = Vec::new();
    for x in 0..4 {
        for y in 0..4 {
            for z in 0..4 {
                let id = (x * 16 + y * 4 + z) as u64;
                lattice.push(Point::new(id, x as f64, y as f64, z as f64));
            }
        }
    }
    let cfg = TopKConfig::default()
        .with_method(Method::Exact)
        .with_verify(true);
    match top_k_pairs(&lattice, 5, &cfg) {
        Ok(top) => {
            let ids: Vec<_> = top.iter().map(|p| p.ids()).collect();
            println!("lattice top-5 (exact, checked against indexed): {ids:?}");
        }
        Err(err) => println!("lattice verification failed: {err}"),
    }
    println!(
        "lattice closest pair: {:?}",
        closest_pair(&lattice).map(|p| p.ids())
    );
}
