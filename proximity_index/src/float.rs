// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Float functions that are not available in `core`.

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("proximity_index requires either the `std` or the `libm` feature");

#[cfg(feature = "std")]
#[inline]
pub(crate) fn sqrt(v: f64) -> f64 {
    v.sqrt()
}

#[cfg(all(not(feature = "std"), feature = "libm"))]
#[inline]
pub(crate) fn sqrt(v: f64) -> f64 {
    libm::sqrt(v)
}
