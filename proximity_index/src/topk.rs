// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Top-k closest pairs.
//!
//! Two paths produce identical answers:
//!
//! - the exact path scans all `n * (n - 1) / 2` pairs and is the reference;
//! - the indexed path asks a [`KdTree`] for each point's `m + 1` nearest
//!   neighbors and widens `m` until the answer is certified.
//!
//! Certification
//! -------------
//! After a round with fan-out `m`, let `r(p)` be the distance to the farthest
//! neighbor retrieved for `p` (infinite if `p` saw every other point) and
//! `d_k` the k-th smallest candidate distance. A pair `(p, q)` that neither
//! side retrieved has distance at least `max(r(p), r(q))`. So if every `r(p)`
//! is strictly greater than `d_k`, no undiscovered pair can reach the top k,
//! ties included. Otherwise `m` roughly doubles; it is capped at `n - 1`, where
//! every pair is seen, so the loop ends after `O(log n)` rounds.

use alloc::collections::{BTreeSet, BinaryHeap};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::kdtree::KdTree;
use crate::types::{ClosePair, PairKey, Point, Ranked};

/// Point count up to which [`Method::Auto`] uses the exact path.
pub const DEFAULT_EXACT_THRESHOLD: usize = 2000;

/// Smallest initial neighbor fan-out of the indexed path.
pub const MIN_NEIGHBOR_FANOUT: usize = 32;

/// Initial neighbor fan-out for a top-`k` query: `max(k + 1, 32)`.
#[inline]
pub fn default_fanout(k: usize) -> usize {
    k.saturating_add(1).max(MIN_NEIGHBOR_FANOUT)
}

/// How [`top_k_pairs`] chooses its path.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Exact path up to [`TopKConfig::exact_threshold`] points, indexed above.
    #[default]
    Auto,
    /// Always scan all pairs.
    Exact,
    /// Always use the certified k-d tree search.
    Indexed,
}

impl Method {
    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Exact => "exact",
            Self::Indexed => "indexed",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "exact" => Ok(Self::Exact),
            "indexed" | "optimized" => Ok(Self::Indexed),
            other => Err(Error::UnknownMethod(other.into())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`top_k_pairs`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TopKConfig {
    /// Path selection.
    pub method: Method,
    /// Largest point count served by the exact path under [`Method::Auto`].
    pub exact_threshold: usize,
    /// Initial fan-out of the indexed path; `None` means [`default_fanout`].
    pub neighbor_fanout: Option<usize>,
    /// When the exact path runs, also run the indexed path and fail on any difference.
    pub verify: bool,
}

impl Default for TopKConfig {
    fn default() -> Self {
        Self {
            method: Method::Auto,
            exact_threshold: DEFAULT_EXACT_THRESHOLD,
            neighbor_fanout: None,
            verify: false,
        }
    }
}

impl TopKConfig {
    /// Set the path selection.
    pub const fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the exact-path threshold used by [`Method::Auto`].
    pub const fn with_exact_threshold(mut self, threshold: usize) -> Self {
        self.exact_threshold = threshold;
        self
    }

    /// Set the initial fan-out of the indexed path.
    pub const fn with_neighbor_fanout(mut self, fanout: usize) -> Self {
        self.neighbor_fanout = Some(fanout);
        self
    }

    /// Cross-check exact results against the indexed path.
    pub const fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

/// Bounded max-heap keeping the `k` smallest pairs seen so far.
#[derive(Debug)]
pub(crate) struct PairHeap {
    k: usize,
    heap: BinaryHeap<Ranked>,
}

impl PairHeap {
    pub(crate) fn new(k: usize, expected: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.min(expected).saturating_add(1)),
        }
    }

    pub(crate) fn offer(&mut self, pair: ClosePair) {
        if self.k == 0 {
            return;
        }
        let cand = Ranked(pair);
        if self.heap.len() < self.k {
            self.heap.push(cand);
        } else if let Some(mut worst) = self.heap.peek_mut()
            && cand < *worst
        {
            *worst = cand;
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.heap.len() == self.k
    }

    /// Distance of the current k-th pair, if `k` pairs are held.
    pub(crate) fn kth_distance(&self) -> Option<f64> {
        if self.is_full() {
            self.heap.peek().map(|r| r.0.distance)
        } else {
            None
        }
    }

    pub(crate) fn into_sorted(self) -> Vec<ClosePair> {
        self.heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
    }
}

fn pair_count(n: usize) -> usize {
    n.saturating_mul(n.saturating_sub(1)) / 2
}

/// The `k` closest pairs of `points`, lower id first in each pair.
///
/// Ascending by distance, ties broken by the first id and then the second.
/// Returns fewer than `k` pairs only when fewer exist, and nothing for fewer
/// than two points.
///
/// # Errors
///
/// [`Error::ZeroK`] if `k == 0`; [`Error::VerificationFailed`] if
/// [`TopKConfig::verify`] is set and the two paths disagree.
pub fn top_k_pairs(points: &[Point], k: usize, config: &TopKConfig) -> Result<Vec<ClosePair>> {
    if k == 0 {
        return Err(Error::ZeroK);
    }
    if points.len() < 2 {
        return Ok(Vec::new());
    }
    let use_exact = match config.method {
        Method::Auto => points.len() <= config.exact_threshold,
        Method::Exact => true,
        Method::Indexed => false,
    };
    if !use_exact {
        return Ok(indexed_top_k(points, k, config.neighbor_fanout));
    }

    let exact = exact_top_k(points, k);
    if config.verify && indexed_top_k(points, k, config.neighbor_fanout) != exact {
        return Err(Error::VerificationFailed);
    }
    Ok(exact)
}

/// All-pairs top-k. `O(n²)` time, `O(k)` memory.
pub fn exact_top_k(points: &[Point], k: usize) -> Vec<ClosePair> {
    let mut top = PairHeap::new(k, pair_count(points.len()));
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            top.offer(ClosePair::measure(*a, *b));
        }
    }
    top.into_sorted()
}

/// Certified top-k over a fresh [`KdTree`] of `points`.
///
/// `fanout` is the initial neighbor count per point; `None` means
/// [`default_fanout`]. The result equals [`exact_top_k`] for every input.
pub fn indexed_top_k(points: &[Point], k: usize, fanout: Option<usize>) -> Vec<ClosePair> {
    if k == 0 || points.len() < 2 {
        return Vec::new();
    }
    let tree = KdTree::build(points);
    indexed_top_k_in(&tree, k, fanout)
}

/// Certified top-k over the points of an existing snapshot.
pub fn indexed_top_k_in(tree: &KdTree, k: usize, fanout: Option<usize>) -> Vec<ClosePair> {
    let n = tree.len();
    if k == 0 || n < 2 {
        return Vec::new();
    }
    let cap = n - 1;
    let mut fanout = fanout.unwrap_or_else(|| default_fanout(k)).clamp(1, cap);
    let mut round = 0_usize;
    loop {
        round += 1;
        let scan = scan_round(tree, k, fanout);
        let certified = scan
            .top
            .kth_distance()
            .is_some_and(|dk| scan.min_radius > dk);
        let complete = fanout >= cap || scan.min_radius == f64::INFINITY;
        debug!(
            round,
            fanout,
            candidates = scan.candidates,
            certified,
            complete,
            "indexed top-k round"
        );
        if certified || complete {
            return scan.top.into_sorted();
        }
        fanout = cap.min(fanout.saturating_mul(2).max(fanout + 1));
    }
}

struct Round {
    top: PairHeap,
    /// Smallest local search radius over all points.
    min_radius: f64,
    candidates: usize,
}

fn scan_round(tree: &KdTree, k: usize, fanout: usize) -> Round {
    let cap = tree.len() - 1;
    let mut seen: BTreeSet<PairKey> = BTreeSet::new();
    let mut top = PairHeap::new(k, tree.len().saturating_mul(fanout));
    let mut min_radius = f64::INFINITY;
    for p in tree.points() {
        let hits = tree.k_nearest(p, fanout + 1);
        let radius = if hits.len() >= cap {
            f64::INFINITY
        } else {
            hits.last().map_or(f64::INFINITY, |h| h.distance)
        };
        min_radius = min_radius.min(radius);
        for h in hits {
            if seen.insert(PairKey::new(p.id, h.point.id)) {
                top.offer(ClosePair::with_distance(h.distance, *p, h.point));
            }
        }
    }
    Round {
        top,
        min_radius,
        candidates: seen.len(),
    }
}

/// The closest pair of `points`, or `None` for fewer than two points.
///
/// Uses one nearest-neighbor query per point; ties follow the same order as
/// [`top_k_pairs`].
pub fn closest_pair(points: &[Point]) -> Option<ClosePair> {
    if points.len() < 2 {
        return None;
    }
    let tree = KdTree::build(points);
    let mut top = PairHeap::new(1, 1);
    for p in points {
        if let Some(h) = tree.nearest(p) {
            top.offer(ClosePair::with_distance(h.distance, *p, h.point));
        }
    }
    top.into_sorted().into_iter().next()
}
