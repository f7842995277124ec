// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Proximity Index: nearest neighbors, top-k pairs, and moving points.

use proximity_index::{IncrementalIndex, KdTree, Method, Point, TopKConfig, top_k_pairs};

fn main() {
    let points = [
        Point::new(0, 0.0, 0.0, 0.0),
        Point::new(1, 1.0, 1.0, 1.0),
        Point::new(2, 0.1, 0.1, 0.1),
        Point::new(3, 5.0, 5.0, 5.0),
    ];

    let tree = KdTree::build(&points);
    for n in tree.k_nearest(&points[0], 2) {
        println!("neighbor of 0: id={} distance={:.4}", n.point.id, n.distance);
    }

    for method in [Method::Exact, Method::Indexed] {
        let cfg = TopKConfig::default().with_method(method);
        let top = top_k_pairs(&points, 3, &cfg).expect("k is non-zero");
        let ids: Vec<_> = top.iter().map(|p| p.ids()).collect();
        println!("{method}: {:?}", ids);
    }

    // Move point 3 next to point 0
    let mut idx = IncrementalIndex::new(points, 10).expect("ids are unique");
    idx.update_point(3, [0.0, 0.0, 0.05]);
    println!(
        "closest after move: {:?} (state {:?})",
        idx.current_closest().map(|p| p.ids()),
        idx.state()
    );
}
