// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static 3D k-d tree with exact k-nearest-neighbor queries.
//!
//! The tree is a read-only snapshot: it is built once from a point list by
//! median splits on a depth-cycling axis and never updated in place. Nodes
//! live in an arena and refer to their children by index; both construction
//! and search use explicit stacks, so very large inputs do not recurse.

use alloc::collections::BinaryHeap;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use crate::float;
use crate::types::{Axis, Point, squared_distance};

/// A 3D k-d tree over a snapshot of points.
#[derive(Clone)]
pub struct KdTree {
    root: Option<NodeIdx>,
    arena: Vec<Node>,
    height: usize,
}

#[derive(Clone, Debug)]
struct Node {
    point: Point,
    axis: Axis,
    /// Points ordered before the median on `axis`.
    left: Option<NodeIdx>,
    /// Points ordered after the median on `axis`.
    right: Option<NodeIdx>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    const fn get(self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone, Debug)]
enum Side {
    Left,
    Right,
}

/// Pending sub-range of the build buffer.
#[derive(Copy, Clone, Debug)]
struct BuildTask {
    lo: usize,
    hi: usize,
    depth: usize,
    parent: Option<(NodeIdx, Side)>,
}

/// One result of a nearest-neighbor query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbor {
    /// Euclidean distance from the query.
    pub distance: f64,
    /// The neighbor as stored in the snapshot.
    pub point: Point,
}

/// Heap entry ordered by `(squared distance, id)`; the heap top is the worst.
#[derive(Copy, Clone, Debug)]
struct Candidate {
    dist_sq: f64,
    point: Point,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.point.id.cmp(&other.point.id))
    }
}

impl Default for KdTree {
    fn default() -> Self {
        Self {
            root: None,
            arena: Vec::new(),
            height: 0,
        }
    }
}

impl KdTree {
    /// Build a tree from `points`.
    ///
    /// Each level stably sorts its range on the depth's axis and takes the
    /// element at `len / 2` as the node, so equal coordinates keep their input
    /// order and may land on either side of the split.
    pub fn build(points: &[Point]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        let mut buf = points.to_vec();
        let mut arena: Vec<Node> = Vec::with_capacity(buf.len());
        let mut root = None;
        let mut height = 0;

        let mut stack = vec![BuildTask {
            lo: 0,
            hi: buf.len(),
            depth: 0,
            parent: None,
        }];
        while let Some(task) = stack.pop() {
            let axis = Axis::for_depth(task.depth);
            let part = &mut buf[task.lo..task.hi];
            debug_assert!(
                part.iter().all(|p| !p.coord(axis).is_nan()),
                "k-d tree coordinates must not be NaN"
            );
            part.sort_by(|a, b| a.coord(axis).total_cmp(&b.coord(axis)));
            let mid = task.lo + part.len() / 2;

            let idx = NodeIdx::new(arena.len());
            arena.push(Node {
                point: buf[mid],
                axis,
                left: None,
                right: None,
            });
            height = height.max(task.depth + 1);
            match task.parent {
                None => root = Some(idx),
                Some((parent, Side::Left)) => arena[parent.get()].left = Some(idx),
                Some((parent, Side::Right)) => arena[parent.get()].right = Some(idx),
            }

            if mid + 1 < task.hi {
                stack.push(BuildTask {
                    lo: mid + 1,
                    hi: task.hi,
                    depth: task.depth + 1,
                    parent: Some((idx, Side::Right)),
                });
            }
            if task.lo < mid {
                stack.push(BuildTask {
                    lo: task.lo,
                    hi: mid,
                    depth: task.depth + 1,
                    parent: Some((idx, Side::Left)),
                });
            }
        }

        Self {
            root,
            arena,
            height,
        }
    }

    /// Number of points in the snapshot.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// True if the snapshot holds no points.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Number of levels; `ceil(log2(n + 1))` for `n` points.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Snapshot points, in arena order.
    pub fn points(&self) -> impl ExactSizeIterator<Item = &Point> + '_ {
        self.arena.iter().map(|n| &n.point)
    }

    /// The `k` points nearest to `query`, ascending by distance.
    ///
    /// Ties on distance go to the lower id. Stored points sharing the query's
    /// id are never reported, even if their coordinates differ (the query may
    /// be a newer version of a snapshot point). Returns every eligible point
    /// when fewer than `k` exist, and nothing for `k == 0`.
    pub fn k_nearest(&self, query: &Point, k: usize) -> Vec<Neighbor> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let mut best: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k.min(self.len()) + 1);
        // Each entry carries a lower bound on the squared distance of its subtree.
        let mut stack = vec![(root, 0.0_f64)];
        while let Some((idx, bound_sq)) = stack.pop() {
            if best.len() == k && best.peek().is_some_and(|worst| bound_sq > worst.dist_sq) {
                continue;
            }
            let node = &self.arena[idx.get()];
            if node.point.id != query.id {
                let cand = Candidate {
                    dist_sq: squared_distance(query, &node.point),
                    point: node.point,
                };
                if best.len() < k {
                    best.push(cand);
                } else if let Some(mut worst) = best.peek_mut()
                    && cand < *worst
                {
                    *worst = cand;
                }
            }

            let q = query.coord(node.axis);
            let split = node.point.coord(node.axis);
            let diff = q - split;
            let (near, far) = if q <= split {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };
            // Far goes first so the whole near subtree is searched before its bound is checked.
            if let Some(far) = far {
                stack.push((far, diff * diff));
            }
            if let Some(near) = near {
                stack.push((near, bound_sq));
            }
        }

        best.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                distance: float::sqrt(c.dist_sq),
                point: c.point,
            })
            .collect()
    }

    /// The single nearest point to `query` with a different id.
    pub fn nearest(&self, query: &Point) -> Option<Neighbor> {
        self.k_nearest(query, 1).into_iter().next()
    }
}

impl Debug for KdTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KdTree")
            .field("points", &self.arena.len())
            .field("height", &self.height)
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}
