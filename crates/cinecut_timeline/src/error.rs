// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for timeline editing.

use crate::clip::ClipId;
use crate::time::Edge;
use crate::track::TrackKind;
use thiserror::Error;

/// Recoverable failures from edit operations and invariant validation.
///
/// Every edit validates against a simulated application of the change first;
/// when one of these is returned, the timeline has not been mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The edit would produce a negative duration or push an in-point out of
    /// its valid range.
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    /// The edit would make the target overlap the given clip on a shared
    /// track kind.
    #[error("edit would overlap clip {0:?}")]
    OverlapViolation(ClipId),

    /// A roll was requested but no clip abuts the target at that edge.
    #[error("no adjacent neighbor at the {0:?} edge")]
    NoAdjacentNeighbor(Edge),

    /// The operation requires a clip that is placed in a layer.
    #[error("clip is not placed in any layer")]
    DetachedElement,

    /// Attaching failed because the timeline has no track of this kind.
    #[error("timeline has no {} track", .0.name())]
    NoCompatibleTrack(TrackKind),
}
