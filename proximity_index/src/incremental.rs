// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Top-k closest pairs kept current while points move.
//!
//! [`IncrementalIndex`] owns the authoritative coordinates, a [`KdTree`]
//! snapshot of them, the set of ids moved since that snapshot, and a cached
//! top-k of the snapshot. Moves are cheap: they overwrite one point and mark
//! it dirty. Once `rebuild_threshold` moves accumulate the snapshot is rebuilt
//! on the spot.
//!
//! Between rebuilds, queries patch the cached answer instead of recomputing
//! it: cached pairs touching a moved point are dropped, moved points are
//! paired with each other exactly and with their nearest unmoved neighbors in
//! the snapshot, and the `k` best of the merged candidates are returned.
//! Unmoved points sit where the snapshot has them, so those neighbor pairs are
//! exact; the snapshot's old copies of moved points are skipped.
//! Pairs of unmoved points keep their cached distances, which are still exact,
//! but pairs that ranked beyond the cached `k` are not revisited until the next
//! rebuild. The rebuild threshold is therefore the knob that trades freshness
//! for update throughput; call [`IncrementalIndex::rebuild`] before a batch of
//! reads that must be exact.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt::Debug;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::kdtree::KdTree;
use crate::topk::{PairHeap, default_fanout, indexed_top_k_in};
use crate::types::{ClosePair, PairKey, Point, PointId};

/// Moves accumulated before an automatic rebuild, by default.
pub const DEFAULT_REBUILD_THRESHOLD: usize = 50;

/// Tuning for [`IncrementalIndex`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IncrementalConfig {
    /// Number of moves that forces a snapshot rebuild. Must be at least 1.
    pub rebuild_threshold: usize,
    /// Initial fan-out of the certified search that fills the cache; `None`
    /// means [`default_fanout`].
    pub neighbor_fanout: Option<usize>,
    /// Neighbors fetched per moved point while patching; `None` means
    /// [`default_fanout`] of the requested `k`.
    pub reconcile_fanout: Option<usize>,
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        Self {
            rebuild_threshold: DEFAULT_REBUILD_THRESHOLD,
            neighbor_fanout: None,
            reconcile_fanout: None,
        }
    }
}

impl IncrementalConfig {
    /// Set the rebuild threshold.
    pub const fn with_rebuild_threshold(mut self, threshold: usize) -> Self {
        self.rebuild_threshold = threshold;
        self
    }

    /// Set the initial fan-out of cache fills.
    pub const fn with_neighbor_fanout(mut self, fanout: usize) -> Self {
        self.neighbor_fanout = Some(fanout);
        self
    }

    /// Set the per-point fan-out used while patching.
    pub const fn with_reconcile_fanout(mut self, fanout: usize) -> Self {
        self.reconcile_fanout = Some(fanout);
        self
    }
}

/// Whether moves are pending since the last rebuild.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexState {
    /// The snapshot matches the current coordinates.
    Clean,
    /// Some points moved; fewer than `rebuild_threshold` moves are pending.
    Dirty,
}

#[derive(Clone, Debug)]
struct TopKCache {
    k: usize,
    pairs: Vec<ClosePair>,
}

/// Closest-pair index over moving points.
///
/// Single-threaded by design: queries take `&mut self` because they may fill
/// the cache. Share an instance behind one mutex if several threads need it.
#[derive(Clone)]
pub struct IncrementalIndex {
    points: Vec<Point>,
    slots: BTreeMap<PointId, usize>,
    tree: KdTree,
    dirty: BTreeSet<PointId>,
    /// Moves since the last rebuild; counts repeated moves of one id.
    pending: usize,
    cache: Option<TopKCache>,
    config: IncrementalConfig,
    rebuilds: usize,
}

impl IncrementalIndex {
    /// Build an index over `points` with the given rebuild threshold.
    ///
    /// # Errors
    ///
    /// [`Error::ZeroRebuildThreshold`] for a zero threshold and
    /// [`Error::DuplicateId`] if two points share an id.
    pub fn new<I, P>(points: I, rebuild_threshold: usize) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        Self::with_config(
            points,
            IncrementalConfig::default().with_rebuild_threshold(rebuild_threshold),
        )
    }

    /// Build an index over `points` with explicit tuning.
    ///
    /// # Errors
    ///
    /// Same as [`IncrementalIndex::new`].
    pub fn with_config<I, P>(points: I, config: IncrementalConfig) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        if config.rebuild_threshold == 0 {
            return Err(Error::ZeroRebuildThreshold);
        }
        let points: Vec<Point> = points.into_iter().map(Into::into).collect();
        let mut slots = BTreeMap::new();
        for (slot, p) in points.iter().enumerate() {
            if slots.insert(p.id, slot).is_some() {
                return Err(Error::DuplicateId(p.id));
            }
        }
        let tree = KdTree::build(&points);
        debug!(
            points = points.len(),
            rebuild_threshold = config.rebuild_threshold,
            "built incremental index"
        );
        Ok(Self {
            points,
            slots,
            tree,
            dirty: BTreeSet::new(),
            pending: 0,
            cache: None,
            config,
            rebuilds: 0,
        })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the index holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Current coordinates of `id`.
    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.slots.get(&id).map(|&slot| &self.points[slot])
    }

    /// All points with their current coordinates, in construction order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The snapshot queries run against.
    pub fn snapshot(&self) -> &KdTree {
        &self.tree
    }

    /// Current tuning.
    pub fn config(&self) -> &IncrementalConfig {
        &self.config
    }

    /// [`IndexState::Clean`] when no moves are pending.
    pub fn state(&self) -> IndexState {
        if self.pending == 0 {
            IndexState::Clean
        } else {
            IndexState::Dirty
        }
    }

    /// Moves applied since the last rebuild.
    pub fn dirty_count(&self) -> usize {
        self.pending
    }

    /// Ids moved since the last rebuild, ascending.
    pub fn dirty_ids(&self) -> impl ExactSizeIterator<Item = PointId> + '_ {
        self.dirty.iter().copied()
    }

    /// Rebuilds performed since construction.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    /// Change the rebuild threshold, rebuilding at once if it is already met.
    ///
    /// # Errors
    ///
    /// [`Error::ZeroRebuildThreshold`] for a zero threshold.
    pub fn set_rebuild_threshold(&mut self, threshold: usize) -> Result<()> {
        if threshold == 0 {
            return Err(Error::ZeroRebuildThreshold);
        }
        self.config.rebuild_threshold = threshold;
        if self.pending >= threshold {
            self.rebuild_snapshot("threshold lowered");
        }
        Ok(())
    }

    /// Move `id` to `coords`.
    ///
    /// Unknown ids are ignored and return `false`; late updates for points the
    /// caller never registered are expected in simulations. Reaching the
    /// rebuild threshold rebuilds the snapshot before returning.
    pub fn update_point(&mut self, id: PointId, coords: [f64; 3]) -> bool {
        let Some(&slot) = self.slots.get(&id) else {
            trace!(id, "ignoring update for unknown point");
            return false;
        };
        self.points[slot] = self.points[slot].moved_to(coords);
        self.pending += 1;
        self.dirty.insert(id);
        if self.pending >= self.config.rebuild_threshold {
            self.rebuild_snapshot("threshold reached");
        }
        true
    }

    /// Rebuild the snapshot from current coordinates and drop the cache.
    pub fn rebuild(&mut self) {
        self.rebuild_snapshot("requested");
    }

    fn rebuild_snapshot(&mut self, reason: &'static str) {
        self.tree = KdTree::build(&self.points);
        self.dirty.clear();
        self.pending = 0;
        self.cache = None;
        self.rebuilds += 1;
        debug!(
            points = self.points.len(),
            reason,
            rebuilds = self.rebuilds,
            "rebuilt k-d tree snapshot"
        );
    }

    /// Make sure the cache holds at least the snapshot's top `k`.
    fn ensure_cache(&mut self, k: usize) {
        if let Some(cache) = &self.cache
            && cache.k >= k
        {
            trace!(k, cached_k = cache.k, "top-k cache hit");
            return;
        }
        trace!(k, "top-k cache miss");
        let pairs = indexed_top_k_in(&self.tree, k, self.config.neighbor_fanout);
        self.cache = Some(TopKCache { k, pairs });
    }

    fn cached_pairs(&self) -> &[ClosePair] {
        self.cache.as_ref().map_or(&[], |c| c.pairs.as_slice())
    }

    /// The `k` closest pairs under current coordinates.
    ///
    /// Exact while [`IndexState::Clean`]; patched from the cache while dirty
    /// (see the module docs for what patching can miss). Calling this twice
    /// without moves in between returns identical results.
    ///
    /// # Errors
    ///
    /// [`Error::ZeroK`] if `k == 0`.
    pub fn current_top_k(&mut self, k: usize) -> Result<Vec<ClosePair>> {
        if k == 0 {
            return Err(Error::ZeroK);
        }
        if self.points.len() < 2 {
            return Ok(Vec::new());
        }

        if self.pending == 0 {
            self.ensure_cache(k);
            return Ok(self.cached_pairs().iter().take(k).copied().collect());
        }

        let base_k = self.cache.as_ref().map_or(k, |c| c.k.max(k));
        self.ensure_cache(base_k);
        Ok(self.reconcile(k))
    }

    /// Merge the cached snapshot answer with fresh pairs of moved points.
    fn reconcile(&self, k: usize) -> Vec<ClosePair> {
        let fanout = self
            .config
            .reconcile_fanout
            .unwrap_or_else(|| default_fanout(k));
        let cached = self.cached_pairs();
        let mut seen: BTreeSet<PairKey> = BTreeSet::new();
        let mut top = PairHeap::new(
            k,
            cached
                .len()
                .saturating_add(self.dirty.len().saturating_mul(fanout)),
        );

        // Both ends are unmoved, so the cached distance is still current.
        for pair in cached {
            if self.dirty.contains(&pair.first.id) || self.dirty.contains(&pair.second.id) {
                continue;
            }
            seen.insert(pair.key());
            top.offer(*pair);
        }

        let movers: Vec<Point> = self
            .dirty
            .iter()
            .filter_map(|&id| self.point(id).copied())
            .collect();
        for (i, a) in movers.iter().enumerate() {
            for b in &movers[i + 1..] {
                if seen.insert(PairKey::new(a.id, b.id)) {
                    top.offer(ClosePair::measure(*a, *b));
                }
            }
        }
        // Stale copies of moved points may fill the answer; ask for enough
        // extra hits that `fanout + 1` unmoved neighbors remain.
        let wanted = fanout.saturating_add(1).saturating_add(movers.len());
        for p in &movers {
            for hit in self.tree.k_nearest(p, wanted) {
                if self.dirty.contains(&hit.point.id) {
                    continue;
                }
                let Some(q) = self.point(hit.point.id) else {
                    continue;
                };
                if seen.insert(PairKey::new(p.id, q.id)) {
                    top.offer(ClosePair::measure(*p, *q));
                }
            }
        }
        trace!(
            k,
            movers = movers.len(),
            candidates = seen.len(),
            "patched cached top-k"
        );
        top.into_sorted()
    }

    /// The closest pair under current coordinates.
    ///
    /// `None` stands for "no pair, infinite distance" and is returned for
    /// fewer than two points.
    pub fn current_closest(&mut self) -> Option<ClosePair> {
        self.current_top_k(1).ok()?.into_iter().next()
    }

    /// Move a random subset of points by a bounded random step.
    ///
    /// Picks `max(1, floor(len * fraction))` distinct points using a
    /// [`StdRng`] seeded with `seed`, adds a uniform offset in `[-step, step]`
    /// to each coordinate, and applies the moves through
    /// [`update_point`](Self::update_point). Returns the number of points
    /// moved.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidWalk`] if `fraction` is outside `[0, 1]` or `step` is
    /// negative or not finite.
    pub fn batch_random_walk(&mut self, fraction: f64, step: f64, seed: u64) -> Result<usize> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.random_walk_with(&mut rng, fraction, step)
    }

    /// [`batch_random_walk`](Self::batch_random_walk) with a caller-supplied generator.
    ///
    /// # Errors
    ///
    /// Same as [`batch_random_walk`](Self::batch_random_walk).
    pub fn random_walk_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        fraction: f64,
        step: f64,
    ) -> Result<usize> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::InvalidWalk("fraction must be within [0, 1]"));
        }
        if !step.is_finite() || step < 0.0 {
            return Err(Error::InvalidWalk("step must be finite and non-negative"));
        }
        let n = self.points.len();
        if n == 0 {
            return Ok(0);
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "fraction is within [0, 1], so the product fits in usize and truncation is the intended floor."
        )]
        let count = ((n as f64 * fraction) as usize).clamp(1, n);
        let chosen = rand::seq::index::sample(rng, n, count);
        for slot in chosen.iter() {
            let p = self.points[slot];
            let coords = [
                p.x + rng.gen_range(-step..=step),
                p.y + rng.gen_range(-step..=step),
                p.z + rng.gen_range(-step..=step),
            ];
            self.update_point(p.id, coords);
        }
        Ok(count)
    }
}

impl Debug for IncrementalIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IncrementalIndex")
            .field("points", &self.points.len())
            .field("state", &self.state())
            .field("pending", &self.pending)
            .field("rebuild_threshold", &self.config.rebuild_threshold)
            .field("cached_k", &self.cache.as_ref().map(|c| c.k))
            .field("rebuilds", &self.rebuilds)
            .finish_non_exhaustive()
    }
}
