// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proximity Index: exact closest-pair queries over 3D points.
//!
//! - Build a balanced 3D [`KdTree`] and run exact k-nearest-neighbor queries.
//! - Ask for the `k` closest pairs of a point set with [`top_k_pairs`], either
//!   by scanning every pair or through a certified k-d tree search that always
//!   returns the same answer.
//! - Keep the closest pairs of moving points current with [`IncrementalIndex`],
//!   which batches moves and rebuilds its snapshot every `rebuild_threshold`
//!   updates.
//!
//! Results are deterministic: pairs are ordered by distance, then by the lower
//! id, then by the higher id, and every path computes distances the same way.
//!
//! # Example
//!
//! ```rust
//! use proximity_index::{IncrementalIndex, Point, TopKConfig, top_k_pairs};
//!
//! let points = [
//!     Point::new(0, 0.0, 0.0, 0.0),
//!     Point::new(1, 1.0, 1.0, 1.0),
//!     Point::new(2, 0.1, 0.1, 0.1),
//!     Point::new(3, 5.0, 5.0, 5.0),
//! ];
//! let top = top_k_pairs(&points, 2, &TopKConfig::default()).unwrap();
//! assert_eq!(top[0].ids(), (0, 2));
//! assert_eq!(top[1].ids(), (1, 2));
//!
//! // Track the same points as they move.
//! let mut idx = IncrementalIndex::new(points, 10).unwrap();
//! idx.update_point(3, [0.0, 0.0, 0.05]);
//! let closest = idx.current_closest().unwrap();
//! assert_eq!(closest.ids(), (0, 3));
//! ```
//!
//! ## Choosing a method
//!
//! - [`Method::Exact`]: `O(n²)` scan; simplest, and fastest for small inputs.
//! - [`Method::Indexed`]: `O(n log n)` per round; certified against the exact
//!   answer, including ties.
//! - [`Method::Auto`] (default): exact up to
//!   [`TopKConfig::exact_threshold`] points, indexed above.
//!
//! ### Float semantics
//!
//! Coordinates are assumed finite. Debug builds assert on NaN during tree
//! construction.
//!
//! ## Features
//!
//! - `std` (default): square roots from `std`, and `std` support in the
//!   error and tracing crates.
//! - `libm`: square roots from `libm` for `no_std` targets.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
mod float;
pub mod incremental;
pub mod kdtree;
pub mod topk;
pub mod types;

pub use error::{Error, Result};
pub use incremental::{IncrementalConfig, IncrementalIndex, IndexState};
pub use kdtree::{KdTree, Neighbor};
pub use topk::{Method, TopKConfig, closest_pair, exact_top_k, indexed_top_k, top_k_pairs};
pub use types::{Axis, ClosePair, PairKey, Point, PointId, distance, squared_distance};
