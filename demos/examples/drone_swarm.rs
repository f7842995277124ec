// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A swarm of drones drifting at random while the closest pair is tracked.
//!
//! Each tick moves a small fraction of the swarm and asks the incremental
//! index for its closest pairs. The index patches its cached answer between
//! rebuilds and rebuilds its k-d tree every `REBUILD_THRESHOLD` moves.
//!
//! Run:
//! - `cargo run -p proximity_demos --example drone_swarm`
//! - `RUST_LOG=proximity_index=debug cargo run -p proximity_demos --example drone_swarm`

use proximity_index::{IncrementalIndex, Point, TopKConfig, top_k_pairs};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DRONES: u64 = 2_000;
const REBUILD_THRESHOLD: usize = 50;
const TICKS: u64 = 12;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut rng = StdRng::seed_from_u64(2025);
    let drones: Vec<Point> = (0..DRONES)
        .map(|id| {
            Point::new(
                id,
                rng.gen_range(0.0..1_000.0),
                rng.gen_range(0.0..1_000.0),
                rng.gen_range(0.0..200.0),
            )
        })
        .collect();

    let mut swarm = match IncrementalIndex::new(drones, REBUILD_THRESHOLD) {
        Ok(swarm) => swarm,
        Err(err) => {
            eprintln!("cannot build swarm: {err}");
            return;
        }
    };
    info!(drones = swarm.len(), "swarm launched");

    for tick in 0..TICKS {
        let moved = match swarm.random_walk_with(&mut rng, 0.01, 3.0) {
            Ok(moved) => moved,
            Err(err) => {
                eprintln!("walk failed: {err}");
                return;
            }
        };
        let top = swarm.current_top_k(3).unwrap_or_default();
        if let Some(closest) = top.first() {
            info!(
                tick,
                moved,
                first = closest.first.id,
                second = closest.second.id,
                distance = closest.distance,
                state = ?swarm.state(),
                pending = swarm.dirty_count(),
                rebuilds = swarm.rebuild_count(),
                "closest drones"
            );
        }
    }

    // Compare the tracked answer with a from-scratch query.
    swarm.rebuild();
    let tracked = swarm.current_top_k(3).unwrap_or_default();
    let fresh = top_k_pairs(swarm.points(), 3, &TopKConfig::default()).unwrap_or_default();
    info!(matches = tracked == fresh, "final check after rebuild");
}
