// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track elements: the per-track realization of a clip.

use crate::clip::ClipId;
use crate::time::{Interval, Time};
use crate::track::{TrackId, TrackKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a track element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub Uuid);

impl ElementId {
    /// Create a new random element ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

/// A single-track timed object.
///
/// Owned by exactly one clip; the track reference is an association only and
/// is `None` while detached. The element's interval is derived from its
/// parent clip: start and duration mirror the clip, the in-point is the
/// clip's in-point plus this element's offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackElement {
    /// Unique element ID
    pub id: ElementId,
    clip: ClipId,
    kind: TrackKind,
    interval: Interval,
    in_offset: Time,
    priority: u32,
    track: Option<TrackId>,
    max_duration: Option<Time>,
}

impl TrackElement {
    pub(crate) fn new(clip: ClipId, kind: TrackKind, interval: Interval, priority: u32) -> Self {
        Self {
            id: ElementId::new(),
            clip,
            kind,
            interval,
            in_offset: 0,
            priority,
            track: None,
            max_duration: None,
        }
    }

    /// The clip this element belongs to
    pub fn clip(&self) -> ClipId {
        self.clip
    }

    /// Media kind of this element
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Current interval on the timeline
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Exclusive end position
    pub fn end(&self) -> Time {
        self.interval.end()
    }

    /// Additional in-point offset relative to the parent clip
    pub fn in_offset(&self) -> Time {
        self.in_offset
    }

    /// Priority band, mirrored from the owning layer
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Track this element is attached to, if any
    pub fn track(&self) -> Option<TrackId> {
        self.track
    }

    /// Whether the element is currently bound to a track
    pub fn is_attached(&self) -> bool {
        self.track.is_some()
    }

    /// Maximum duration available from the underlying resource, if known.
    ///
    /// Bounds `in_point + duration` during edit validation.
    pub fn max_duration(&self) -> Option<Time> {
        self.max_duration
    }

    /// Record the maximum available duration reported by the resource
    pub fn set_max_duration(&mut self, max: Option<Time>) {
        self.max_duration = max;
    }

    pub(crate) fn set_track(&mut self, track: Option<TrackId>) {
        self.track = track;
    }

    pub(crate) fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
    }

    pub(crate) fn set_in_offset(&mut self, offset: Time) {
        self.in_offset = offset;
    }

    pub(crate) fn set_priority(&mut self, priority: u32) {
        self.priority = priority;
    }
}
