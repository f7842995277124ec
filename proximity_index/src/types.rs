// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;

use crate::float;

/// Stable identifier of a point. Never reused within one index.
pub type PointId = u64;

/// A point in 3D with a stable id.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    /// Stable id.
    pub id: PointId,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Point {
    /// Create a new point.
    pub const fn new(id: PointId, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z }
    }

    /// Coordinate along `axis`.
    #[inline]
    pub const fn coord(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Coordinates as an array.
    #[inline]
    pub const fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Same point with new coordinates.
    #[inline]
    pub const fn moved_to(self, coords: [f64; 3]) -> Self {
        Self::new(self.id, coords[0], coords[1], coords[2])
    }
}

impl From<(PointId, f64, f64, f64)> for Point {
    fn from((id, x, y, z): (PointId, f64, f64, f64)) -> Self {
        Self::new(id, x, y, z)
    }
}

/// Split axis of a k-d tree level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis (depth 0, 3, 6, ...).
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// Axis used at tree depth `depth`, cycling x, y, z.
    #[inline]
    pub const fn for_depth(depth: usize) -> Self {
        match depth % 3 {
            0 => Self::X,
            1 => Self::Y,
            _ => Self::Z,
        }
    }
}

/// Squared Euclidean distance. Symmetric bit-for-bit in its arguments.
#[inline]
pub fn squared_distance(a: &Point, b: &Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    dx * dx + dy * dy + dz * dz
}

/// Euclidean distance.
///
/// Every path that reports a distance goes through this function, so equal
/// pairs always report identical bits.
#[inline]
pub fn distance(a: &Point, b: &Point) -> f64 {
    float::sqrt(squared_distance(a, b))
}

/// Canonical `(min id, max id)` key of an unordered pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(pub PointId, pub PointId);

impl PairKey {
    /// Key for the pair `a`, `b` in either order.
    #[inline]
    pub const fn new(a: PointId, b: PointId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    /// Whether either end of the pair is `id`.
    #[inline]
    pub const fn touches(self, id: PointId) -> bool {
        self.0 == id || self.1 == id
    }
}

/// An unordered pair of points and their distance, reported lower id first.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClosePair {
    /// Euclidean distance between the two points.
    pub distance: f64,
    /// The point with the lower id.
    pub first: Point,
    /// The point with the higher id.
    pub second: Point,
}

impl ClosePair {
    /// Measure the pair `a`, `b` and order it by id.
    pub fn measure(a: Point, b: Point) -> Self {
        let d = distance(&a, &b);
        Self::with_distance(d, a, b)
    }

    /// Build a pair from a distance already computed with [`distance`].
    pub fn with_distance(distance: f64, a: Point, b: Point) -> Self {
        if a.id <= b.id {
            Self {
                distance,
                first: a,
                second: b,
            }
        } else {
            Self {
                distance,
                first: b,
                second: a,
            }
        }
    }

    /// Canonical key of this pair.
    #[inline]
    pub const fn key(&self) -> PairKey {
        PairKey(self.first.id, self.second.id)
    }

    /// Ids of the pair, lower first.
    #[inline]
    pub const fn ids(&self) -> (PointId, PointId) {
        (self.first.id, self.second.id)
    }
}

/// Total order on pairs: distance, then first id, then second id.
#[inline]
pub fn pair_order(a: &ClosePair, b: &ClosePair) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.first.id.cmp(&b.first.id))
        .then(a.second.id.cmp(&b.second.id))
}

/// Heap adapter ordering pairs by [`pair_order`].
#[derive(Copy, Clone, Debug)]
pub(crate) struct Ranked(pub(crate) ClosePair);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        pair_order(&self.0, &other.0) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        pair_order(&self.0, &other.0)
    }
}
