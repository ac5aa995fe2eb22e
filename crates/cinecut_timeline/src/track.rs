// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track definitions: single media-kind lanes spanning all layers.

use crate::element::ElementId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// Media kind of a track.
///
/// A closed enumeration: every track carries exactly one kind and only
/// accepts elements of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    /// Audio samples
    Audio,
    /// Video frames
    Video,
}

impl TrackKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// Whether a track of this kind accepts an element of `kind`.
    pub fn accepts(&self, kind: TrackKind) -> bool {
        *self == kind
    }

    /// All track kinds, for per-kind invariant sweeps.
    pub const ALL: [TrackKind; 2] = [TrackKind::Audio, TrackKind::Video];
}

/// A single media-kind lane aggregating the track elements contributed by
/// clips across all layers.
///
/// The track only associates with its elements; ownership stays with the
/// parent clips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Media kind of this lane
    pub kind: TrackKind,
    /// Attached elements, in attach order
    elements: IndexSet<ElementId>,
}

impl Track {
    /// Create a new track of the given kind
    pub fn new(kind: TrackKind) -> Self {
        Self {
            id: TrackId::new(),
            kind,
            elements: IndexSet::new(),
        }
    }

    /// Iterate over the attached elements
    pub fn elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().copied()
    }

    /// Whether the element is attached to this track
    pub fn contains(&self, element: ElementId) -> bool {
        self.elements.contains(&element)
    }

    /// Number of attached elements
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn insert(&mut self, element: ElementId) {
        self.elements.insert(element);
    }

    pub(crate) fn remove(&mut self, element: ElementId) {
        self.elements.shift_remove(&element);
    }
}
