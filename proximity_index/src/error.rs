// Copyright 2025 the Proximity Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by all query and construction paths.

use alloc::string::String;

use thiserror::Error;

use crate::types::PointId;

/// Errors returned by `proximity_index` operations.
///
/// Every variant except [`Error::VerificationFailed`] reports an invalid
/// argument; none of them is transient, so callers should not retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A top-k query asked for zero pairs.
    #[error("k must be at least 1")]
    ZeroK,

    /// A method string did not name a known top-k method.
    #[error("unknown top-k method `{0}`, expected one of: auto, exact, indexed")]
    UnknownMethod(String),

    /// A rebuild threshold of zero was supplied.
    #[error("rebuild threshold must be at least 1")]
    ZeroRebuildThreshold,

    /// The same id appeared twice in an initial point set.
    #[error("duplicate point id {0}")]
    DuplicateId(PointId),

    /// Random walk parameters out of range.
    #[error("invalid random walk parameter: {0}")]
    InvalidWalk(&'static str),

    /// The indexed path disagreed with the exact path during verification.
    #[error("indexed top-k result differs from the exact result")]
    VerificationFailed,
}

impl Error {
    /// True for errors caused by an argument the caller passed.
    pub const fn is_invalid_argument(&self) -> bool {
        !matches!(self, Self::VerificationFailed)
    }
}

/// Result alias defaulting to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;
